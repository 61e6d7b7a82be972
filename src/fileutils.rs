//! File and directory helpers.
//!
//! "Not found" is treated as a normal outcome (nothing to delete, files not
//! equal, source missing). Every other I/O error is returned to the caller.

use crate::locators::{Env, Locator};
use crate::strutils::{Host, get_windows_host_type, host_machine, normalize_path};
use colored::*;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Create a directory and its parents if missing.
pub fn create_folder_if_needed(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// Delete a file, succeeding if it doesn't exist.
pub fn delete_file(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

pub fn is_write_protected(path: &Path) -> io::Result<bool> {
    Ok(fs::metadata(path)?.permissions().readonly())
}

fn set_writable(path: &Path, writable: bool) -> io::Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = perms.mode();
        perms.set_mode(if writable { mode | 0o222 } else { mode & !0o222 });
    }
    #[cfg(not(unix))]
    perms.set_readonly(!writable);
    fs::set_permissions(path, perms)
}

/// Add execute permission wherever read permission is set.
pub fn make_executable(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        let mode = perms.mode();
        perms.set_mode(mode | ((mode & 0o444) >> 2));
        fs::set_permissions(path, perms)
    }
    #[cfg(not(unix))]
    {
        fs::metadata(path).map(|_| ())
    }
}

/// Result of [`is_source_newer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceNewer {
    /// The destination is at least as new as the source
    No,
    /// The destination is older or missing
    Yes,
    /// The source doesn't exist
    MissingSource,
}

/// Compare modification times of `source` and `destination`.
pub fn is_source_newer(source: &Path, destination: &Path) -> SourceNewer {
    let Ok(source_time) = fs::metadata(source).and_then(|m| m.modified()) else {
        return SourceNewer::MissingSource;
    };
    match fs::metadata(destination).and_then(|m| m.modified()) {
        Ok(dest_time) if dest_time >= source_time => SourceNewer::No,
        _ => SourceNewer::Yes,
    }
}

/// Copy `source` over `destination` if the destination is older or missing.
///
/// Returns `true` if a copy was made.
pub fn copy_file_if_needed(source: &Path, destination: &Path, verbose: bool) -> io::Result<bool> {
    if is_source_newer(source, destination) != SourceNewer::Yes {
        return Ok(false);
    }
    if verbose {
        println!("Copying {} -> {}", source.display(), destination.display());
    }
    fs::copy(source, destination)?;
    Ok(true)
}

/// Like [`copy_file_if_needed`], but a write protected destination is
/// opened for edit in Perforce first.
pub fn copy_file_checkout_if_needed<E: Env>(
    source: &Path,
    destination: &Path,
    verbose: bool,
    locator: &mut Locator<E>,
) -> io::Result<bool> {
    if is_source_newer(source, destination) != SourceNewer::Yes {
        return Ok(false);
    }
    if destination.exists() && is_write_protected(destination)? {
        crate::vcs::perforce::perforce_edit(locator, &[destination.to_path_buf()], verbose);
    }
    if verbose {
        println!("Copying {} -> {}", source.display(), destination.display());
    }
    fs::copy(source, destination)?;
    Ok(true)
}

/// Recursively copy newer files, skipping names ending with an exception.
pub fn copy_directory_if_needed(
    source: &Path,
    destination: &Path,
    exceptions: &[&str],
    verbose: bool,
) -> io::Result<()> {
    create_folder_if_needed(destination)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let name = entry.file_name();
        let name_str = name.to_string_lossy();
        if exceptions.iter().any(|e| name_str.ends_with(e)) {
            continue;
        }
        let from = entry.path();
        let to = destination.join(&name);
        if from.is_dir() {
            copy_directory_if_needed(&from, &to, exceptions, verbose)?;
        } else {
            copy_file_if_needed(&from, &to, verbose)?;
        }
    }
    Ok(())
}

/// Remove one entry, clearing write protection on it and its parent if
/// permission is denied.
fn remove_entry(path: &Path, is_dir: bool) -> io::Result<()> {
    let remove = || {
        if is_dir {
            fs::remove_dir(path)
        } else {
            fs::remove_file(path)
        }
    };
    match remove() {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            set_writable(path, true)?;
            if let Some(parent) = path.parent() {
                set_writable(parent, true)?;
            }
            remove()
        }
        Err(e) => Err(e),
    }
}

/// Delete a directory tree.
///
/// Without `delete_read_only` errors are ignored and write protected files
/// may be left behind.
pub fn delete_directory(path: &Path, delete_read_only: bool) -> io::Result<()> {
    if !delete_read_only {
        let _ = fs::remove_dir_all(path);
        return Ok(());
    }
    if !path.exists() {
        return Ok(());
    }
    for entry in WalkDir::new(path).contents_first(true) {
        let entry = entry.map_err(io::Error::from)?;
        remove_entry(entry.path(), entry.file_type().is_dir())?;
    }
    Ok(())
}

fn compile_patterns(patterns: &[&str]) -> io::Result<Vec<regex::Regex>> {
    crate::strutils::translate_to_regex_match(patterns)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}

/// Delete subdirectories whose names match a wildcard pattern.
pub fn clean_directories(path: &Path, patterns: &[&str], recursive: bool) -> io::Result<()> {
    let regexes = compile_patterns(patterns)?;
    clean_directories_with(path, &regexes, recursive)
}

fn clean_directories_with(path: &Path, regexes: &[regex::Regex], recursive: bool) -> io::Result<()> {
    let Ok(entries) = fs::read_dir(path) else {
        return Ok(());
    };
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if regexes.iter().any(|re| re.is_match(&name)) {
            delete_directory(&entry.path(), true)?;
        } else if recursive {
            clean_directories_with(&entry.path(), regexes, recursive)?;
        }
    }
    Ok(())
}

/// Delete files whose names match a wildcard pattern.
///
/// Write protected files are kept unless `delete_read_only`.
pub fn clean_files(
    path: &Path,
    patterns: &[&str],
    recursive: bool,
    delete_read_only: bool,
) -> io::Result<()> {
    let regexes = compile_patterns(patterns)?;
    clean_files_with(path, &regexes, recursive, delete_read_only)
}

fn clean_files_with(
    path: &Path,
    regexes: &[regex::Regex],
    recursive: bool,
    delete_read_only: bool,
) -> io::Result<()> {
    let Ok(entries) = fs::read_dir(path) else {
        return Ok(());
    };
    for entry in entries {
        let entry = entry?;
        let file_path = entry.path();
        if entry.file_type()?.is_dir() {
            if recursive {
                clean_files_with(&file_path, regexes, recursive, delete_read_only)?;
            }
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !regexes.iter().any(|re| re.is_match(&name)) {
            continue;
        }
        if is_write_protected(&file_path)? {
            if !delete_read_only {
                continue;
            }
            set_writable(&file_path, true)?;
        }
        delete_file(&file_path)?;
    }
    Ok(())
}

/// Path of a prebuilt tool for this host.
///
/// Tools live in `macosx/`, `linux/` or `windows/<cpu>/` below `tool_folder`,
/// Windows names get `.exe`. With `encapsulate` the result is quoted.
pub fn get_tool_path(tool_folder: &Path, tool_name: &str, encapsulate: bool) -> String {
    let exe_name = match host_machine() {
        Host::MacOsX => tool_folder.join("macosx").join(tool_name),
        Host::Linux => tool_folder.join("linux").join(tool_name),
        Host::Windows => tool_folder
            .join("windows")
            .join(get_windows_host_type(false).unwrap_or("x64"))
            .join(format!("{}.exe", tool_name)),
        Host::Unknown => PathBuf::from(tool_name),
    };
    let text = exe_name.to_string_lossy().into_owned();
    if encapsulate {
        format!("\"{}\"", text)
    } else {
        text
    }
}

/// Find every copy of the named entries from `working_dir` up to the root.
///
/// The list starts at the root and ends at `working_dir`. With `terminate`
/// the search stops at the first (closest) match.
pub fn traverse_directory(
    working_dir: &Path,
    names: &[&str],
    find_directory: bool,
    terminate: bool,
) -> io::Result<Vec<PathBuf>> {
    let mut current = normalize_path(&std::path::absolute(working_dir)?);
    let mut result = Vec::new();
    loop {
        for name in names {
            let candidate = current.join(name);
            let found = if find_directory {
                candidate.is_dir()
            } else {
                candidate.is_file()
            };
            if found {
                result.insert(0, candidate);
                if terminate {
                    return Ok(result);
                }
            }
        }
        match current.parent() {
            Some(parent) if parent != current => current = parent.to_path_buf(),
            _ => break,
        }
    }
    Ok(result)
}

/// Make every write protected file writable and return the files changed.
pub fn unlock_files(working_dir: &Path, recursive: bool) -> io::Result<Vec<PathBuf>> {
    let abs_dir = std::path::absolute(working_dir)?;
    let mut result = Vec::new();
    for entry in fs::read_dir(&abs_dir)? {
        let path = entry?.path();
        let meta = fs::metadata(&path)?;
        if meta.is_file() {
            if meta.permissions().readonly() {
                set_writable(&path, true)?;
                result.push(path);
            }
        } else if recursive && meta.is_dir() {
            result.extend(unlock_files(&path, true)?);
        }
    }
    Ok(result)
}

/// Write protect every file in `lock_list`, undoing [`unlock_files`].
pub fn lock_files(lock_list: &[PathBuf]) -> io::Result<()> {
    for item in lock_list {
        set_writable(item, false)?;
    }
    Ok(())
}

/// Split text on CR, LF or CRLF. A trailing line ending adds no empty line.
pub fn split_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                lines.push(std::mem::take(&mut current));
            }
            '\n' => lines.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Load a text file as lines, dropping a UTF-8 byte order mark.
///
/// A file that isn't valid UTF-8 is an `InvalidData` error.
pub fn load_text_file(path: &Path) -> io::Result<Vec<String>> {
    let text = String::from_utf8(fs::read(path)?)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(split_lines(text.strip_prefix('\u{feff}').unwrap_or(&text)))
}

/// Write `lines`, each terminated by `line_feed` (`"\n"` by default).
pub fn save_text_file<S: AsRef<str>>(
    path: &Path,
    lines: &[S],
    line_feed: Option<&str>,
    bom: bool,
) -> io::Result<()> {
    let line_feed = line_feed.unwrap_or("\n");
    let mut file = io::BufWriter::new(fs::File::create(path)?);
    if bom {
        file.write_all("\u{feff}".as_bytes())?;
    }
    for line in lines {
        file.write_all(line.as_ref().as_bytes())?;
        file.write_all(line_feed.as_bytes())?;
    }
    file.flush()
}

/// Write `lines` only if the file's content differs.
///
/// Returns `true` if the file was written.
pub fn save_text_file_if_newer<S: AsRef<str>>(
    path: &Path,
    lines: &[S],
    line_feed: Option<&str>,
    bom: bool,
    verbose: bool,
) -> io::Result<bool> {
    if compare_file_to_lines(path, lines)? {
        if verbose {
            println!("{} {} was not changed", "ℹ".blue(), path.display());
        }
        return Ok(false);
    }
    if verbose {
        println!("{} Writing {}", "✓".green(), path.display());
    }
    save_text_file(path, lines, line_feed, bom)?;
    Ok(true)
}

/// Missing files and files that aren't UTF-8 text never match any lines.
fn load_or_none(path: &Path) -> io::Result<Option<Vec<String>>> {
    match load_text_file(path) {
        Ok(lines) => Ok(Some(lines)),
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::InvalidData) => {
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// True if two text files hold the same lines, whatever their line endings.
pub fn compare_files(first: &Path, second: &Path) -> io::Result<bool> {
    let (Some(a), Some(b)) = (load_or_none(first)?, load_or_none(second)?) else {
        return Ok(false);
    };
    Ok(a == b)
}

/// True if a text file holds exactly `lines`. A missing file never matches.
pub fn compare_file_to_lines<S: AsRef<str>>(path: &Path, lines: &[S]) -> io::Result<bool> {
    let Some(file_lines) = load_or_none(path)? else {
        return Ok(false);
    };
    Ok(file_lines.len() == lines.len()
        && file_lines.iter().zip(lines).all(|(a, b)| a == b.as_ref()))
}

pub fn compare_file_to_string(path: &Path, data: &str) -> io::Result<bool> {
    compare_file_to_lines(path, &split_lines(data))
}

/// Character encodings understood by [`read_zero_terminated_string`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Latin1,
}

/// Read bytes up to a zero terminator and decode them.
///
/// Returns `None` if the stream was already at its end. A stream ending
/// without a terminator returns what was read.
pub fn read_zero_terminated_string<R: Read>(
    reader: &mut R,
    encoding: TextEncoding,
) -> io::Result<Option<String>> {
    let mut bytes = Vec::new();
    let mut terminated = false;
    for byte in reader.bytes() {
        let byte = byte?;
        if byte == 0 {
            terminated = true;
            break;
        }
        bytes.push(byte);
    }
    if bytes.is_empty() && !terminated {
        return Ok(None);
    }
    let text = match encoding {
        TextEncoding::Utf8 => String::from_utf8(bytes)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
        TextEncoding::Latin1 => bytes.into_iter().map(char::from).collect(),
    };
    Ok(Some(text))
}
