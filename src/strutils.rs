//! String and path canonicalization.
//!
//! Helpers shared by every build script: host detection, slash conversion,
//! shell quoting for Windows and POSIX shells, boolean and CSV parsing,
//! XML escaping and version strings.
//!
//! ## Quoting
//!
//! ```rust
//! use burger::strutils::{encapsulate_path_linux, encapsulate_path_windows};
//!
//! assert_eq!(encapsulate_path_windows("a b/c"), "\"a b\\c\"");
//! assert_eq!(encapsulate_path_linux("a b"), "'a b'");
//! ```

use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

/// Characters that never need quoting in `cmd.exe`.
const WINDOWS_SAFE_PUNCTUATION: &str = "_-.:\\";

/// Characters that never need quoting in `bash`.
const LINUX_SAFE_PUNCTUATION: &str = "@%_-+=:,./";

/// Errors from string parsing helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrError {
    /// A quoted section was never closed
    UnterminatedQuote(String),
    /// The string can't be read as a boolean
    NotABool(String),
}

impl std::fmt::Display for StrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrError::UnterminatedQuote(s) => write!(f, "String wasn't properly quoted: {}", s),
            StrError::NotABool(s) => write!(f, "Can't convert {} to bool", s),
        }
    }
}

impl std::error::Error for StrError {}

// ---------------------------------------------------------------------------
// Host detection
// ---------------------------------------------------------------------------

/// High level operating system family of the running machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Host {
    Windows,
    MacOsX,
    Linux,
    Unknown,
}

impl Host {
    /// Name used by project generators ("windows", "macosx", "linux").
    pub fn as_str(&self) -> &'static str {
        match self {
            Host::Windows => "windows",
            Host::MacOsX => "macosx",
            Host::Linux => "linux",
            Host::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operating system this binary was built for.
pub fn host_machine() -> Host {
    if cfg!(windows) {
        Host::Windows
    } else if cfg!(target_os = "macos") {
        Host::MacOsX
    } else if cfg!(target_os = "linux") {
        Host::Linux
    } else {
        Host::Unknown
    }
}

/// True when running as a Linux binary under Windows Subsystem for Linux.
pub fn is_wsl() -> bool {
    static WSL: OnceLock<bool> = OnceLock::new();
    *WSL.get_or_init(|| {
        cfg!(target_os = "linux")
            && std::fs::read_to_string("/proc/version")
                .map(|v| v.contains("icrosoft"))
                .unwrap_or(false)
    })
}

/// True if the machine is running Windows, either natively or hosting WSL.
pub fn is_windows_host() -> bool {
    cfg!(windows) || is_wsl()
}

/// CPU name of a Windows host, `None` if not on Windows.
///
/// Linux under Windows only reports a CPU when `wsl_allowed` is set.
pub fn get_windows_host_type(wsl_allowed: bool) -> Option<&'static str> {
    if !is_windows_host() {
        return None;
    }
    if !cfg!(windows) && !wsl_allowed {
        return None;
    }
    Some(windows_cpu_name(std::env::consts::ARCH))
}

fn windows_cpu_name(arch: &str) -> &'static str {
    match arch {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        "arm" => "arm",
        _ => "x86",
    }
}

/// CPU name of a macOS host, `None` if not on macOS.
pub fn get_mac_host_type() -> Option<&'static str> {
    static MAC_HOST: OnceLock<Option<&'static str>> = OnceLock::new();
    *MAC_HOST.get_or_init(|| {
        if cfg!(target_os = "macos") {
            Some(mac_cpu_name(std::env::consts::ARCH))
        } else {
            None
        }
    })
}

fn mac_cpu_name(arch: &str) -> &'static str {
    match arch {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        "powerpc" => "ppc",
        "powerpc64" => "ppc64",
        _ => "x86",
    }
}

// ---------------------------------------------------------------------------
// Booleans
// ---------------------------------------------------------------------------

/// Parse a string as a boolean.
///
/// Accepts "true/t/on/yes/y" and "false/f/off/no/n" in any case, then any
/// integer or float where non zero is `true`.
pub fn string_to_bool(item: &str) -> Result<bool, StrError> {
    let lower = item.to_lowercase();
    match lower.as_str() {
        "true" | "t" | "on" | "yes" | "y" => return Ok(true),
        "false" | "f" | "off" | "no" | "n" => return Ok(false),
        _ => {}
    }
    let trimmed = item.trim();
    if let Ok(value) = trimmed.parse::<i128>() {
        return Ok(value != 0);
    }
    if let Ok(value) = trimmed.parse::<f64>() {
        return Ok(value != 0.0);
    }
    Err(StrError::NotABool(item.to_string()))
}

/// Loose truthiness for the `true_false` family.
///
/// Empty containers, zero and the strings "0" or "false" are false.
pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

impl Truthy for str {
    fn is_truthy(&self) -> bool {
        !(self.is_empty() || self == "0" || self.eq_ignore_ascii_case("false"))
    }
}

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        self.as_str().is_truthy()
    }
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl Truthy for i64 {
    fn is_truthy(&self) -> bool {
        *self != 0
    }
}

impl Truthy for u32 {
    fn is_truthy(&self) -> bool {
        *self != 0
    }
}

impl Truthy for f64 {
    fn is_truthy(&self) -> bool {
        *self != 0.0
    }
}

impl<T> Truthy for [T] {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Truthy for Vec<T> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T: Truthy> Truthy for Option<T> {
    fn is_truthy(&self) -> bool {
        self.as_ref().is_some_and(Truthy::is_truthy)
    }
}

/// "True" or "False".
pub fn true_false<T: Truthy + ?Sized>(item: &T) -> &'static str {
    if item.is_truthy() { "True" } else { "False" }
}

/// "true" or "false".
pub fn true_false_lower<T: Truthy + ?Sized>(item: &T) -> &'static str {
    if item.is_truthy() { "true" } else { "false" }
}

/// "TRUE" or "FALSE".
pub fn true_false_upper<T: Truthy + ?Sized>(item: &T) -> &'static str {
    if item.is_truthy() { "TRUE" } else { "FALSE" }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Replace every `/` with `\`, optionally forcing a trailing `\`.
pub fn convert_to_windows_slashes(path_name: &str, force_ending_slash: bool) -> String {
    let mut result = path_name.replace('/', "\\");
    if force_ending_slash && !result.ends_with('\\') {
        result.push('\\');
    }
    result
}

/// Replace every `\` with `/`, optionally forcing a trailing `/`.
pub fn convert_to_linux_slashes(path_name: &str, force_ending_slash: bool) -> String {
    let mut result = path_name.replace('\\', "/");
    if force_ending_slash && !result.ends_with('/') {
        result.push('/');
    }
    result
}

/// Map a drive path like `C:\foo` to its WSL mount `/mnt/c/foo`.
///
/// Paths without a drive letter only get their slashes converted.
pub fn windows_to_wsl_path(path_name: &str) -> String {
    let bytes = path_name.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        let drive = (bytes[0] as char).to_ascii_lowercase();
        let rest = convert_to_linux_slashes(&path_name[2..], false);
        let rest = rest.trim_start_matches('/');
        if rest.is_empty() {
            return format!("/mnt/{}/", drive);
        }
        return format!("/mnt/{}/{}", drive, rest);
    }
    convert_to_linux_slashes(path_name, false)
}

/// Inverse of [`windows_to_wsl_path`], `/mnt/c/foo` becomes `C:\foo`.
pub fn wsl_to_windows_path(path_name: &str) -> String {
    if let Some(rest) = path_name.strip_prefix("/mnt/") {
        let mut chars = rest.chars();
        if let Some(drive) = chars.next()
            && drive.is_ascii_alphabetic()
        {
            let tail = chars.as_str();
            if tail.is_empty() || tail.starts_with('/') {
                return format!(
                    "{}:{}",
                    drive.to_ascii_uppercase(),
                    convert_to_windows_slashes(if tail.is_empty() { "/" } else { tail }, false)
                );
            }
        }
    }
    convert_to_windows_slashes(path_name, false)
}

/// Convert a path reported by Windows (registry, vswhere) into a host path.
pub fn convert_from_windows_path(path_name: &str) -> String {
    if is_wsl() {
        windows_to_wsl_path(path_name)
    } else {
        path_name.to_string()
    }
}

/// Convert a host path into one Windows tools can open.
pub fn convert_to_windows_path(path_name: &str) -> String {
    if is_wsl() {
        wsl_to_windows_path(path_name)
    } else {
        path_name.to_string()
    }
}

/// Quote a path for `cmd.exe`.
///
/// Slashes become backslashes. Strings made only of safe characters are
/// returned as is, anything else is wrapped in double quotes. Embedded
/// double quotes and any backslashes in front of them or of the closing
/// quote are escaped so the argument parses back unchanged.
pub fn encapsulate_path_windows(input_path: &str) -> String {
    let temp = convert_to_windows_slashes(input_path, false);
    if temp.is_empty() {
        return "\"\"".to_string();
    }
    let safe = temp
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || WINDOWS_SAFE_PUNCTUATION.contains(c));
    if safe {
        return temp;
    }
    let mut out = String::with_capacity(temp.len() + 2);
    out.push('"');
    let mut backslashes = 0;
    for c in temp.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' => {
                out.push_str(&"\\".repeat(backslashes * 2 + 1));
                out.push('"');
                backslashes = 0;
            }
            _ => {
                out.push_str(&"\\".repeat(backslashes));
                out.push(c);
                backslashes = 0;
            }
        }
    }
    out.push_str(&"\\".repeat(backslashes * 2));
    out.push('"');
    out
}

/// Quote a path for `bash`.
///
/// Backslashes become slashes. Unsafe strings are single quoted, embedded
/// single quotes are spliced in as `'"'"'`.
pub fn encapsulate_path_linux(input_path: &str) -> String {
    let temp = convert_to_linux_slashes(input_path, false);
    if temp.is_empty() {
        return "''".to_string();
    }
    let safe = temp
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || LINUX_SAFE_PUNCTUATION.contains(c));
    if safe {
        temp
    } else {
        format!("'{}'", temp.replace('\'', "'\"'\"'"))
    }
}

/// Quote a path for the native shell of this build.
pub fn encapsulate_path(input_path: &str) -> String {
    if cfg!(windows) {
        encapsulate_path_windows(input_path)
    } else {
        encapsulate_path_linux(input_path)
    }
}

/// Quote a path for the Windows shell whenever the host is Windows, WSL included.
pub fn encapsulate_hosted_path(input_path: &str) -> String {
    if is_windows_host() {
        encapsulate_path_windows(&convert_to_windows_path(input_path))
    } else {
        encapsulate_path_linux(input_path)
    }
}

/// Lexically normalize a path, folding `.` and `..` components.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(result.components().next_back(), Some(Component::Normal(_))) {
                    result.pop();
                } else if !result.has_root() {
                    result.push("..");
                }
            }
            other => result.push(other.as_os_str()),
        }
    }
    if result.as_os_str().is_empty() {
        result.push(".");
    }
    result
}

/// Resolve each item against `working_directory` and normalize it.
pub fn norm_paths<I, S>(working_directory: &Path, items: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = S>,
    S: AsRef<Path>,
{
    items
        .into_iter()
        .map(|item| normalize_path(&working_directory.join(item)))
        .collect()
}

/// Join paths into a single search string like `a;b;c`.
///
/// `slashes` converts each entry to `\` or `/` first. The separator
/// defaults to `;`.
pub fn packed_paths<S: AsRef<str>>(
    entries: &[S],
    slashes: Option<char>,
    separator: Option<&str>,
    force_ending_slash: bool,
) -> String {
    let separator = separator.filter(|s| !s.is_empty()).unwrap_or(";");
    let converted: Vec<String> = entries
        .iter()
        .map(|entry| match slashes {
            Some('\\') => convert_to_windows_slashes(entry.as_ref(), force_ending_slash),
            Some(_) => convert_to_linux_slashes(entry.as_ref(), force_ending_slash),
            None => entry.as_ref().to_string(),
        })
        .collect();
    converted.join(separator)
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

/// Split on commas that are not inside single or double quotes.
///
/// Backslash escapes the next character. A trailing empty entry is dropped.
pub fn split_comma_with_quotes(comma_string: &str) -> Result<Vec<String>, StrError> {
    let mut result = Vec::new();
    let mut marker = 0;
    let mut delimiter: Option<char> = None;
    let mut chars = comma_string.char_indices();

    while let Some((index, c)) = chars.next() {
        if c == '\\' {
            chars.next();
            continue;
        }
        match delimiter {
            None => {
                if c == ',' {
                    result.push(comma_string[marker..index].to_string());
                    marker = index + 1;
                } else if c == '"' || c == '\'' {
                    delimiter = Some(c);
                }
            }
            Some(d) if d == c => delimiter = None,
            Some(_) => {}
        }
    }

    if delimiter.is_some() {
        return Err(StrError::UnterminatedQuote(comma_string.to_string()));
    }
    let tail = &comma_string[marker..];
    if !tail.is_empty() {
        result.push(tail.to_string());
    }
    Ok(result)
}

/// Parse a comma separated list, unquoting quoted entries.
///
/// Entries are trimmed. A quoted entry has its quotes removed and doubled
/// quote characters collapsed, so `"a""b"` becomes `a"b`.
pub fn parse_csv(csv_string: &str) -> Result<Vec<String>, StrError> {
    let mut result = Vec::new();
    for item in split_comma_with_quotes(csv_string)? {
        let temp = item.trim_matches(|c| matches!(c, '\n' | '\r' | ' ' | '\t'));
        match temp.chars().next() {
            Some(quote @ ('"' | '\'')) => result.push(unquote_field(temp, quote)),
            _ => result.push(temp.to_string()),
        }
    }
    Ok(result)
}

fn unquote_field(field: &str, quote: char) -> String {
    let mut result = String::with_capacity(field.len());
    let mut in_quote = false;
    let mut chars = field.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quote {
            if c == quote {
                if chars.peek() == Some(&quote) {
                    result.push(quote);
                    chars.next();
                } else {
                    in_quote = false;
                }
            } else {
                result.push(c);
            }
        } else if c == quote {
            in_quote = true;
        } else if c == ',' {
            break;
        } else {
            result.push(c);
        }
    }
    result
}

/// Translate shell wildcards into anchored regexes.
///
/// `*` matches anything, `?` one character, `[...]` a set (`[!...]` negates).
pub fn translate_to_regex_match<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>, regex::Error> {
    patterns
        .iter()
        .map(|p| Regex::new(&wildcard_to_regex(p.as_ref())))
        .collect()
}

fn wildcard_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("^(?s:");
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        i += 1;
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => {
                // Find the closing bracket, a leading ! or ] is literal.
                let mut j = i;
                if j < chars.len() && chars[j] == '!' {
                    j += 1;
                }
                if j < chars.len() && chars[j] == ']' {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }
                if j >= chars.len() {
                    out.push_str("\\[");
                } else {
                    let mut set: String = chars[i..j].iter().collect();
                    i = j + 1;
                    set = set.replace('\\', "\\\\");
                    if let Some(rest) = set.strip_prefix('!') {
                        set = format!("^{}", rest);
                    } else if set.starts_with('^') {
                        set = format!("\\{}", set);
                    }
                    out.push('[');
                    out.push_str(&set);
                    out.push(']');
                }
            }
            _ => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out.push_str(")\\z");
    out
}

// ---------------------------------------------------------------------------
// XML
// ---------------------------------------------------------------------------

/// Escape `&`, `<` and `>` for XML character data.
pub fn escape_xml_cdata(xml_string: &str) -> String {
    xml_string
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape a string for a double quoted XML attribute.
///
/// Line breaks of any style become `&#10;` and tabs become `&#09;`.
pub fn escape_xml_attribute(xml_string: &str) -> String {
    escape_xml_cdata(xml_string)
        .replace('"', "&quot;")
        .replace("\r\n", "&#10;")
        .replace('\r', "&#10;")
        .replace('\n', "&#10;")
        .replace('\t', "&#09;")
}

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

/// Convert "1.0.5rc" into `[1, 0, 5]`.
///
/// A component that isn't a number contributes its first run of digits.
/// Parsing stops at the first component without any digits. Components too
/// large for an `i64` saturate.
pub fn make_version_tuple(version_string: &str) -> Vec<i64> {
    let mut result = Vec::new();
    if version_string.is_empty() {
        return result;
    }
    for item in version_string.split('.') {
        let trimmed = item.trim();
        if let Ok(value) = trimmed.parse::<i64>() {
            result.push(value);
            continue;
        }
        if let Some(magnitude) = trimmed.strip_prefix('-')
            && !magnitude.is_empty()
            && magnitude.bytes().all(|b| b.is_ascii_digit())
        {
            result.push(i64::MIN);
            continue;
        }
        let digits: String = item
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if digits.is_empty() {
            break;
        }
        result.push(digits.parse::<i64>().unwrap_or(i64::MAX));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_to_bool() {
        for s in ["true", "T", "On", "YES", "y", "1", "-3", "0.5"] {
            assert_eq!(string_to_bool(s), Ok(true), "{s}");
        }
        for s in ["false", "F", "off", "No", "n", "0", "0.0"] {
            assert_eq!(string_to_bool(s), Ok(false), "{s}");
        }
        assert!(string_to_bool("skldjsk").is_err());
        assert!(string_to_bool("").is_err());
    }

    #[test]
    fn test_true_false_family() {
        assert_eq!(true_false("0"), "False");
        assert_eq!(true_false("FaLsE"), "False");
        assert_eq!(true_false("anything-else"), "True");
        assert_eq!(true_false(""), "False");
        assert_eq!(true_false_lower("0"), "false");
        assert_eq!(true_false_lower("x"), "true");
        assert_eq!(true_false_upper("false"), "FALSE");
        assert_eq!(true_false_upper(&1i64), "TRUE");
        assert_eq!(true_false(&Vec::<String>::new()), "False");
        assert_eq!(true_false(&vec![0]), "True");
        assert_eq!(true_false(&0.0f64), "False");
        assert_eq!(true_false(&None::<bool>), "False");
    }

    #[test]
    fn test_slashes() {
        assert_eq!(convert_to_windows_slashes("a/b/c", false), "a\\b\\c");
        assert_eq!(convert_to_windows_slashes("a/b", true), "a\\b\\");
        assert_eq!(convert_to_windows_slashes("a\\", true), "a\\");
        assert_eq!(convert_to_linux_slashes("a\\b\\c", false), "a/b/c");
        assert_eq!(convert_to_linux_slashes("a\\b", true), "a/b/");
        assert_eq!(convert_to_linux_slashes("", true), "/");
    }

    #[test]
    fn test_encapsulate_path_windows() {
        assert_eq!(encapsulate_path_windows(""), "\"\"");
        assert_eq!(encapsulate_path_windows("C:/foo/bar.txt"), "C:\\foo\\bar.txt");
        assert_eq!(
            encapsulate_path_windows("C:/Program Files/x"),
            "\"C:\\Program Files\\x\""
        );
        assert_eq!(encapsulate_path_windows("a\"b"), "\"a\\\"b\"");
    }

    /// Split one argument the way the Microsoft C runtime does.
    fn parse_windows_argument(quoted: &str) -> String {
        let chars: Vec<char> = quoted.chars().collect();
        let mut out = String::new();
        let mut in_quotes = false;
        let mut i = 0;
        while i < chars.len() {
            let mut backslashes = 0;
            while i < chars.len() && chars[i] == '\\' {
                backslashes += 1;
                i += 1;
            }
            if i < chars.len() && chars[i] == '"' {
                out.push_str(&"\\".repeat(backslashes / 2));
                if backslashes % 2 == 1 {
                    out.push('"');
                } else {
                    in_quotes = !in_quotes;
                }
                i += 1;
            } else {
                out.push_str(&"\\".repeat(backslashes));
                if i < chars.len() {
                    assert!(in_quotes || chars[i] != ' ', "unquoted space in {}", quoted);
                    out.push(chars[i]);
                    i += 1;
                }
            }
        }
        assert!(!in_quotes, "unterminated quote in {}", quoted);
        out
    }

    #[test]
    fn test_encapsulate_path_windows_round_trip() {
        assert_eq!(encapsulate_path_windows("C:\\a b\\"), "\"C:\\a b\\\\\"");
        assert_eq!(
            encapsulate_path_windows("C:\\x\\\"y z"),
            "\"C:\\x\\\\\\\"y z\""
        );
        for path in [
            "C:\\Program Files\\Tool\\",
            "C:\\a b\\\\",
            "say \"hi\"",
            "C:\\dir\\\"quoted\" name",
            "plain",
            "C:\\trailing\\",
            "with space",
        ] {
            assert_eq!(
                parse_windows_argument(&encapsulate_path_windows(path)),
                path,
                "{}",
                path
            );
        }
    }

    #[test]
    fn test_encapsulate_path_linux() {
        assert_eq!(encapsulate_path_linux(""), "''");
        assert_eq!(encapsulate_path_linux("foo/bar@1,2"), "foo/bar@1,2");
        assert_eq!(encapsulate_path_linux("a\\b c"), "'a/b c'");
        assert_eq!(encapsulate_path_linux("it's"), "'it'\"'\"'s'");
        assert_eq!(encapsulate_path_linux("a;rm"), "'a;rm'");
    }

    /// Undo POSIX shell quoting of a single word.
    fn shell_unquote(s: &str) -> String {
        let mut out = String::new();
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            match c {
                '\'' => {
                    for d in chars.by_ref() {
                        if d == '\'' {
                            break;
                        }
                        out.push(d);
                    }
                }
                '"' => {
                    for d in chars.by_ref() {
                        if d == '"' {
                            break;
                        }
                        out.push(d);
                    }
                }
                _ => out.push(c),
            }
        }
        out
    }

    #[test]
    fn test_encapsulate_linux_unquotes_to_original() {
        for s in ["plain", "with space", "it's here", "$HOME & more", "x'y'z", ""] {
            assert_eq!(shell_unquote(&encapsulate_path_linux(s)), s);
        }
    }

    #[test]
    fn test_split_comma_with_quotes() {
        assert_eq!(
            split_comma_with_quotes("\"foo,bar\",foo,bar").unwrap(),
            vec!["\"foo,bar\"", "foo", "bar"]
        );
        assert_eq!(
            split_comma_with_quotes(",x,\"y,z\",").unwrap(),
            vec!["", "x", "\"y,z\""]
        );
        assert_eq!(split_comma_with_quotes("a\\,b,c").unwrap(), vec!["a\\,b", "c"]);
        assert!(split_comma_with_quotes("\"foo,bar").is_err());
        assert!(split_comma_with_quotes("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_csv() {
        assert_eq!(
            parse_csv("\"foo,bar\", foo ,bar").unwrap(),
            vec!["foo,bar", "foo", "bar"]
        );
        assert_eq!(
            parse_csv("\"y\"\"z\",'y''z',,last").unwrap(),
            vec!["y\"z", "y'z", "", "last"]
        );
        assert!(parse_csv("'open").is_err());
    }

    #[test]
    fn test_translate_to_regex_match() {
        let regexes = translate_to_regex_match(&["*.pyc", "file?.txt", "[!a]b", "x.y"]).unwrap();
        assert!(regexes[0].is_match("foo.pyc"));
        assert!(!regexes[0].is_match("foo.pyco"));
        assert!(regexes[1].is_match("file1.txt"));
        assert!(!regexes[1].is_match("file12.txt"));
        assert!(regexes[2].is_match("bb"));
        assert!(!regexes[2].is_match("ab"));
        assert!(regexes[3].is_match("x.y"));
        assert!(!regexes[3].is_match("xzy"));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml_cdata("a<b>&c"), "a&lt;b&gt;&amp;c");
        assert_eq!(
            escape_xml_attribute("\"q\"\r\n\r\n\t"),
            "&quot;q&quot;&#10;&#10;&#10;&#09;"
        );
    }

    #[test]
    fn test_packed_paths() {
        assert_eq!(packed_paths(&["a", "b", "c"], None, None, false), "a;b;c");
        assert_eq!(
            packed_paths(&["a/b", "c"], Some('\\'), Some(":"), true),
            "a\\b\\:c\\"
        );
        assert_eq!(packed_paths(&["a\\b"], Some('/'), None, false), "a/b");
    }

    #[test]
    fn test_make_version_tuple() {
        assert_eq!(make_version_tuple("1.0.5rc"), vec![1, 0, 5]);
        assert_eq!(make_version_tuple("10.0.22621.0"), vec![10, 0, 22621, 0]);
        assert_eq!(make_version_tuple("v2.beta.3"), vec![2]);
        assert!(make_version_tuple("").is_empty());
        assert_eq!(
            make_version_tuple("1.99999999999999999999.3"),
            vec![1, i64::MAX, 3]
        );
        assert_eq!(make_version_tuple("-99999999999999999999"), vec![i64::MIN]);
    }

    #[test]
    fn test_wsl_paths() {
        assert_eq!(windows_to_wsl_path("C:\\Program Files\\x"), "/mnt/c/Program Files/x");
        assert_eq!(windows_to_wsl_path("D:"), "/mnt/d/");
        assert_eq!(wsl_to_windows_path("/mnt/c/foo/bar"), "C:\\foo\\bar");
        assert_eq!(wsl_to_windows_path("/home/user"), "\\home\\user");
    }

    #[test]
    fn test_norm_paths() {
        let base = Path::new("/base/dir");
        let result = norm_paths(base, ["a/../b", "./c", "/abs/./x"]);
        assert_eq!(
            result,
            vec![
                PathBuf::from("/base/dir/b"),
                PathBuf::from("/base/dir/c"),
                PathBuf::from("/abs/x"),
            ]
        );
    }

    #[test]
    fn test_host_types() {
        assert_eq!(windows_cpu_name("x86_64"), "x64");
        assert_eq!(windows_cpu_name("aarch64"), "arm64");
        assert_eq!(windows_cpu_name("x86"), "x86");
        assert_eq!(mac_cpu_name("x86_64"), "x64");
        if !is_windows_host() {
            assert_eq!(get_windows_host_type(true), None);
        }
        assert!(!host_machine().as_str().is_empty());
    }
}
