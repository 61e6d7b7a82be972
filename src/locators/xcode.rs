//! Xcode discovery and the `rez` resource compiler.

use crate::run::run_command;
use crate::strutils::get_mac_host_type;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Locations of CodeWarrior 9 or 10
const CODEWARRIOR_LOCATIONS: [&str; 2] = [
    "/Applications/Metrowerks CodeWarrior 10.0",
    "/Applications/Metrowerks CodeWarrior 9.0",
];

/// Stand alone Xcode 3 install used by some build machines.
const XCODE3_FALLBACK: &str = "/Xcode3.1.4/usr/bin/xcodebuild";

fn short_version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<key>CFBundleShortVersionString</key>\s*<string>\s*(\d+)")
            .expect("valid regex")
    })
}

/// Major version from the text of an Xcode `version.plist`.
///
/// Only the XML plist format Xcode ships is understood. A binary
/// (`bplist00`) file yields `None`.
pub fn parse_plist_major_version(plist: &str) -> Option<u32> {
    short_version_regex()
        .captures(plist)
        .and_then(|caps| caps[1].parse().ok())
}

/// Search for `xcodebuild` below a developer root and an applications folder.
///
/// Xcode 3 lives in `<developer>/Applications` with its tools in
/// `<developer>/usr/bin`, newer versions are self contained bundles in
/// `applications`. With a `version` only that major version is accepted,
/// otherwise the highest one found wins.
pub fn find_xcode(
    version: Option<u32>,
    developer: &Path,
    applications: &Path,
) -> Option<(PathBuf, u32)> {
    let mut dirs = Vec::new();
    if version.is_none_or(|v| v < 5) {
        dirs.push(developer.join("Applications"));
    }
    if version.is_none_or(|v| v > 3) {
        dirs.push(applications.to_path_buf());
    }

    let mut best: Option<(PathBuf, u32)> = None;
    for dir in dirs {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.to_lowercase().starts_with("xcode"))
            .collect();
        names.sort();

        for name in names {
            let app = dir.join(&name);
            let Ok(plist) = std::fs::read_to_string(app.join("Contents").join("version.plist"))
            else {
                continue;
            };
            let Some(major) = parse_plist_major_version(&plist) else {
                continue;
            };
            let xcodebuild = if major == 3 {
                developer.join("usr/bin/xcodebuild")
            } else {
                app.join("Contents/Developer/usr/bin/xcodebuild")
            };
            if !xcodebuild.is_file() {
                continue;
            }
            match version {
                Some(wanted) if wanted == major => return Some((xcodebuild, major)),
                Some(_) => {}
                None => {
                    if best.as_ref().is_none_or(|(_, v)| major > *v) {
                        best = Some((xcodebuild, major));
                    }
                }
            }
        }
    }
    best
}

/// Path to `xcodebuild` and its major version. Always `None` off macOS.
pub fn where_is_xcode(version: Option<u32>) -> Option<(PathBuf, u32)> {
    get_mac_host_type()?;
    let found = find_xcode(version, Path::new("/Developer"), Path::new("/Applications"));
    if found.is_none() && matches!(version, None | Some(3)) && Path::new(XCODE3_FALLBACK).is_file()
    {
        return Some((PathBuf::from(XCODE3_FALLBACK), 3));
    }
    found
}

/// Where the `.r` headers are, and whether frameworks replace them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RezHeaders {
    pub path: PathBuf,
    /// `true` for Xcode 5+ SDKs, which dropped the FlatCarbon headers
    pub use_frameworks: bool,
}

/// Resource headers from a CodeWarrior install or the Xcode owning
/// `xcodebuild`.
pub fn rez_headers_for(codewarrior: &[&Path], xcodebuild: Option<&Path>) -> Option<RezHeaders> {
    if let Some(cw) = codewarrior.iter().find(|p| p.is_dir()) {
        return Some(RezHeaders {
            path: cw.join("Metrowerks CodeWarrior/MacOS Support/Universal/Interfaces/RIncludes"),
            use_frameworks: false,
        });
    }

    // .../usr/bin/xcodebuild
    let xcode_dir = xcodebuild?.parent()?.parent()?.parent()?;
    if xcode_dir.starts_with("/Developer") {
        let sdks = xcode_dir.join("SDKs");
        let mut names: Vec<PathBuf> = std::fs::read_dir(&sdks)
            .ok()?
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        names.sort();
        let latest = names.pop()?;
        return Some(RezHeaders {
            path: latest.join("Developer/Headers/FlatCarbon"),
            use_frameworks: false,
        });
    }
    Some(RezHeaders {
        path: xcode_dir.join("Platforms/MacOSX.platform/Developer/SDKs/MacOSX.sdk"),
        use_frameworks: true,
    })
}

/// Locate the resource headers on this Mac.
pub fn find_rez_headers() -> Option<RezHeaders> {
    get_mac_host_type()?;
    let codewarrior: Vec<&Path> = CODEWARRIOR_LOCATIONS.iter().map(Path::new).collect();
    let xcode = where_is_xcode(None);
    rez_headers_for(&codewarrior, xcode.as_ref().map(|(p, _)| p.as_path()))
}

/// Finder metadata for a compiled resource file.
#[derive(Debug, Clone, Default)]
pub struct RezOptions<'a> {
    /// Four character creator code
    pub creator: Option<&'a str>,
    /// Four character file type
    pub filetype: Option<&'a str>,
    pub frameworks: &'a [&'a str],
}

/// Command line for `rez`.
pub fn rez_command(
    headers: &RezHeaders,
    input_file: &str,
    output_file: &str,
    options: &RezOptions,
) -> Vec<String> {
    let mut cmd = vec!["rez".to_string()];
    let dir = headers.path.to_string_lossy().into_owned();
    if headers.use_frameworks {
        cmd.extend(["-d".into(), "USING_FRAMEWORKS".into(), "-is".into(), dir]);
        for framework in options.frameworks {
            cmd.extend(["-F".to_string(), framework.to_string()]);
        }
    } else {
        if let Some(creator) = options.creator {
            cmd.extend(["-c".to_string(), creator.to_string()]);
        }
        if let Some(filetype) = options.filetype {
            cmd.extend(["-t".to_string(), filetype.to_string()]);
        }
        cmd.extend(["-i".to_string(), dir]);
    }
    cmd.extend(["-o".to_string(), output_file.to_string(), input_file.to_string()]);
    cmd
}

/// `SetFile` command applying creator and type, if either is set.
pub fn set_file_command(output_file: &str, options: &RezOptions) -> Option<Vec<String>> {
    if options.creator.is_none() && options.filetype.is_none() {
        return None;
    }
    let mut cmd = vec!["SetFile".to_string()];
    if let Some(creator) = options.creator {
        cmd.extend(["-c".to_string(), creator.to_string()]);
    }
    if let Some(filetype) = options.filetype {
        cmd.extend(["-t".to_string(), filetype.to_string()]);
    }
    cmd.push(output_file.to_string());
    Some(cmd)
}

/// Compile a `.r` file. Returns `10` when not on a Mac or no headers exist,
/// otherwise the exit code of the tools.
pub fn build_rez(
    working_directory: &Path,
    input_file: &str,
    output_file: &str,
    options: &RezOptions,
) -> i32 {
    if get_mac_host_type().is_none() {
        return 10;
    }
    let Some(headers) = find_rez_headers() else {
        return 10;
    };
    let cmd = rez_command(&headers, input_file, output_file, options);
    let mut result = run_command(&cmd, Some(working_directory), false, false, false);
    // Modern rez ignores -c and -t.
    if result.success()
        && headers.use_frameworks
        && let Some(set_file) = set_file_command(output_file, options)
    {
        result = run_command(&set_file, Some(working_directory), false, false, false);
    }
    result.code
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
	<key>CFBundleShortVersionString</key>
	<string>15.2</string>
</dict>
</plist>"#;

    fn make_xcode(applications: &Path, name: &str, plist: &str) -> PathBuf {
        let app = applications.join(name);
        let bin = app.join("Contents/Developer/usr/bin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(app.join("Contents/version.plist"), plist).unwrap();
        let xcodebuild = bin.join("xcodebuild");
        std::fs::write(&xcodebuild, "").unwrap();
        xcodebuild
    }

    #[test]
    fn test_parse_plist_major_version() {
        assert_eq!(parse_plist_major_version(PLIST), Some(15));
        assert_eq!(parse_plist_major_version("<plist/>"), None);
        // Binary plists hold the key and value without XML tags
        let binary = "bplist00\u{d1}\u{1}\u{2}_\u{10}\u{1a}CFBundleShortVersionStringT15.2";
        assert_eq!(parse_plist_major_version(binary), None);
    }

    #[test]
    fn test_find_xcode_picks_highest() {
        let dir = TempDir::new().unwrap();
        let apps = dir.path().join("Applications");
        let developer = dir.path().join("Developer");
        make_xcode(&apps, "Xcode14.app", &PLIST.replace("15.2", "14.3"));
        let newest = make_xcode(&apps, "Xcode.app", PLIST);
        std::fs::create_dir_all(apps.join("Safari.app")).unwrap();

        assert_eq!(find_xcode(None, &developer, &apps), Some((newest, 15)));
        let (path, major) = find_xcode(Some(14), &developer, &apps).unwrap();
        assert_eq!(major, 14);
        assert!(path.starts_with(apps.join("Xcode14.app")));
        assert_eq!(find_xcode(Some(9), &developer, &apps), None);
    }

    #[test]
    fn test_find_xcode3_uses_developer_tools() {
        let dir = TempDir::new().unwrap();
        let developer = dir.path().join("Developer");
        let app = developer.join("Applications/Xcode.app/Contents");
        std::fs::create_dir_all(&app).unwrap();
        std::fs::write(app.join("version.plist"), PLIST.replace("15.2", "3.2.6")).unwrap();
        let apps = dir.path().join("Applications");

        assert_eq!(find_xcode(Some(3), &developer, &apps), None);
        std::fs::create_dir_all(developer.join("usr/bin")).unwrap();
        std::fs::write(developer.join("usr/bin/xcodebuild"), "").unwrap();
        assert_eq!(
            find_xcode(Some(3), &developer, &apps),
            Some((developer.join("usr/bin/xcodebuild"), 3))
        );
    }

    #[test]
    fn test_rez_headers_prefer_codewarrior() {
        let dir = TempDir::new().unwrap();
        let headers = rez_headers_for(&[dir.path()], None).unwrap();
        assert!(!headers.use_frameworks);
        assert!(headers.path.ends_with("RIncludes"));
    }

    #[test]
    fn test_rez_headers_modern_xcode() {
        let xcodebuild = Path::new("/Applications/Xcode.app/Contents/Developer/usr/bin/xcodebuild");
        let headers = rez_headers_for(&[], Some(xcodebuild)).unwrap();
        assert!(headers.use_frameworks);
        assert_eq!(
            headers.path,
            PathBuf::from(
                "/Applications/Xcode.app/Contents/Developer/Platforms/MacOSX.platform/Developer/SDKs/MacOSX.sdk"
            )
        );
        assert_eq!(rez_headers_for(&[], None), None);
    }

    #[test]
    fn test_rez_command_lines() {
        let classic = RezHeaders {
            path: PathBuf::from("/h"),
            use_frameworks: false,
        };
        let options = RezOptions {
            creator: Some("BURG"),
            filetype: Some("APPL"),
            frameworks: &["Carbon"],
        };
        assert_eq!(
            rez_command(&classic, "in.r", "out.rsrc", &options),
            vec!["rez", "-c", "BURG", "-t", "APPL", "-i", "/h", "-o", "out.rsrc", "in.r"]
        );
        let modern = RezHeaders {
            use_frameworks: true,
            ..classic
        };
        assert_eq!(
            rez_command(&modern, "in.r", "out.rsrc", &options),
            vec!["rez", "-d", "USING_FRAMEWORKS", "-is", "/h", "-F", "Carbon", "-o", "out.rsrc", "in.r"]
        );
        assert_eq!(
            set_file_command("out.rsrc", &options).unwrap(),
            vec!["SetFile", "-c", "BURG", "-t", "APPL", "out.rsrc"]
        );
        assert_eq!(set_file_command("out.rsrc", &RezOptions::default()), None);
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_build_rez_off_mac() {
        assert_eq!(
            build_rez(Path::new("."), "in.r", "out.rsrc", &RezOptions::default()),
            10
        );
        assert_eq!(where_is_xcode(None), None);
    }
}
