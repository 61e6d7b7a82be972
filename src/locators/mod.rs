//! Developer tool discovery.
//!
//! Every lookup follows the same fixed priority order and the first match
//! wins:
//!
//! 1. An explicit path override, which is cached.
//! 2. The cached result of an earlier lookup, unless `refresh` is set.
//! 3. A tool specific environment variable.
//! 4. The `PATH` (with `PATHEXT` on Windows).
//! 5. Platform fallbacks: registry values and `Program Files` on Windows,
//!    application bundles and MacPorts on macOS, `/usr/bin` on Linux.
//!
//! Results are cached on the [`Locator`], which the caller owns. A failed
//! lookup is never retried implicitly.

pub mod tools;
pub mod types;
pub mod windows;
pub mod xcode;

pub use types::{
    Env, HostFlags, InstanceKind, LookupOptions, MemoryEnv, SystemEnv, Tool, ToolCache,
    VisualStudioInstance,
};

use crate::strutils::{convert_from_windows_path, encapsulate_path, normalize_path};
use crate::fileutils::traverse_directory;
use colored::*;
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// `Program Files` style variables searched on Windows hosts.
pub const WINDOWS_ENV_PATHS: [&str; 2] = ["ProgramFiles", "ProgramFiles(x86)"];

/// True if `path` is a regular file the current user may execute.
pub fn is_exe(path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// Executable suffixes from `pathext`, or `PATHEXT` when not given.
///
/// Linux under Windows defaults to `.EXE` when `PATHEXT` isn't exported.
pub fn get_path_ext(env: &dyn Env, host: &HostFlags, pathext: Option<&str>) -> Vec<String> {
    let value = match pathext {
        Some(p) => p.to_string(),
        None => match env.var("PATHEXT") {
            Some(p) => p,
            None if host.windows && !host.native_windows => return vec![".EXE".to_string()],
            None => return Vec::new(),
        },
    };
    let separator = if cfg!(windows) { ';' } else { ':' };
    value
        .split(|c| c == separator || c == ';')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Find the executable form of `exe_path`, appending each suffix from
/// `pathext` if it doesn't already end with one.
pub fn make_exe_path(exe_path: &Path, pathext: &[String]) -> Option<PathBuf> {
    let text = exe_path.to_string_lossy();
    let lower = text.to_lowercase();
    let candidates: Vec<PathBuf> =
        if pathext.is_empty() || pathext.iter().any(|e| lower.ends_with(&e.to_lowercase())) {
            vec![exe_path.to_path_buf()]
        } else {
            pathext
                .iter()
                .map(|e| PathBuf::from(format!("{}{}", text, e)))
                .collect()
        };
    candidates.into_iter().find(|p| is_exe(p))
}

/// Used when `PATH` isn't set. Windows hosts search `%SystemRoot%\System32`.
fn default_search_path(env: &dyn Env, host: &HostFlags) -> Vec<PathBuf> {
    if host.windows {
        let root = env
            .var("SystemRoot")
            .unwrap_or_else(|| "C:\\Windows".to_string());
        vec![
            PathBuf::from(convert_from_windows_path(&format!("{}\\System32", root))),
            PathBuf::from(convert_from_windows_path(&root)),
        ]
    } else {
        vec![PathBuf::from("/bin"), PathBuf::from("/usr/bin")]
    }
}

fn normcase(path: &Path) -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(path.to_string_lossy().to_lowercase())
    } else {
        path.to_path_buf()
    }
}

/// Search directories for `filename`.
///
/// `search_path` replaces `PATH`. On Windows hosts the working directory is
/// searched first when using `PATH`. Directories are only visited once.
pub fn find_in_path(
    env: &dyn Env,
    host: &HostFlags,
    cwd: &Path,
    filename: &str,
    search_path: Option<&[PathBuf]>,
    executable: bool,
) -> Option<PathBuf> {
    let mut names = vec![filename.to_string()];
    if executable {
        let pathext = get_path_ext(env, host, None);
        let lower = filename.to_lowercase();
        if !pathext.is_empty() && !pathext.iter().any(|e| lower.ends_with(&e.to_lowercase())) {
            names = pathext.iter().map(|e| format!("{}{}", filename, e)).collect();
            if host.windows && !host.native_windows {
                names.push(filename.to_string());
            }
        }
    }

    let mut dirs: Vec<PathBuf> = match search_path {
        Some(list) => list.to_vec(),
        None => match env.var("PATH") {
            Some(raw) => std::env::split_paths(&raw).collect(),
            None => default_search_path(env, host),
        },
    };
    if search_path.is_none() && host.windows {
        dirs.insert(0, cwd.to_path_buf());
    }

    let mut tested = HashSet::new();
    for dir in dirs {
        let dir = normcase(&dir);
        if !tested.insert(dir.clone()) {
            continue;
        }
        for name in &names {
            let candidate = dir.join(name);
            let found = if executable {
                is_exe(&candidate)
            } else {
                candidate.is_file()
            };
            if found {
                return Some(normcase(&normalize_path(&candidate)));
            }
        }
    }
    None
}

fn env_var_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$(?:\{([^}]*)\}|([A-Za-z_][A-Za-z0-9_]*))").expect("valid regex")
    })
}

/// Replace `$NAME` and `${NAME}` with their values. Unknown variables are
/// left as is.
pub fn expand_vars(env: &dyn Env, input: &str) -> String {
    env_var_regex()
        .replace_all(input, |caps: &Captures| {
            let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            env.var(name).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Expand variables in `file_string` and return it only if it names a file.
pub fn expand_and_verify(env: &dyn Env, file_string: &str) -> Option<PathBuf> {
    let path = PathBuf::from(convert_from_windows_path(&expand_vars(env, file_string)));
    path.is_file().then_some(path)
}

/// Command prefix to launch a .NET executable, `mono` off Windows.
pub fn fix_csharp(host: &HostFlags, csharp_application_path: &str) -> Vec<String> {
    if host.windows {
        vec![csharp_application_path.to_string()]
    } else {
        vec!["mono".to_string(), encapsulate_path(csharp_application_path)]
    }
}

/// True if a macOS release string is old enough for CodeWarrior (10.0-10.6).
pub fn codewarrior_allowed_for(release: &str) -> bool {
    let mut parts = release.trim().split('.');
    let major = parts.next().and_then(|p| p.parse::<f64>().ok());
    let minor = parts.next().and_then(|p| p.parse::<f64>().ok());
    matches!((major, minor), (Some(major), Some(minor)) if major >= 10.0 && major < 11.0 && minor < 7.0)
}

/// True if running on a version of macOS that can still run CodeWarrior.
pub fn is_codewarrior_mac_allowed() -> bool {
    if crate::strutils::get_mac_host_type().is_none() {
        return false;
    }
    let result = crate::run::run_command(&["sw_vers", "-productVersion"], None, true, true, true);
    result.success() && codewarrior_allowed_for(&result.stdout)
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Static description of how to find one tool.
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    pub tool: Tool,
    /// Name used in the "not found" diagnostic
    pub display: &'static str,
    pub env_var: Option<&'static str>,
    /// Appended to the environment variable on Windows hosts, tried in order
    pub env_suffixes_windows: &'static [&'static str],
    /// Appended to the environment variable elsewhere
    pub env_suffixes_posix: &'static [&'static str],
    /// Executable name searched in `PATH`
    pub path_name: &'static str,
    /// Appended to each `Program Files` variable
    pub program_files_suffixes: &'static [&'static str],
    pub mac_paths: &'static [&'static str],
    pub linux_paths: &'static [&'static str],
    /// Extra Windows candidate, checked before `Program Files`
    pub windows_extra: Option<fn() -> Option<PathBuf>>,
    pub mac_hint: Option<&'static str>,
}

/// Step 3: the environment variable, which must name an executable.
pub fn from_env_var(env: &dyn Env, host: &HostFlags, spec: &ToolSpec) -> Option<PathBuf> {
    let base = env.var(spec.env_var?)?;
    let suffixes = if host.windows {
        spec.env_suffixes_windows
    } else {
        spec.env_suffixes_posix
    };
    suffixes
        .iter()
        .map(|suffix| {
            let joined = format!("{}{}", base, suffix);
            PathBuf::from(if host.windows {
                convert_from_windows_path(&joined)
            } else {
                joined
            })
        })
        .find(|p| is_exe(p))
}

/// Step 4: the executable search path.
pub fn from_search_path(
    env: &dyn Env,
    host: &HostFlags,
    cwd: &Path,
    spec: &ToolSpec,
) -> Option<PathBuf> {
    find_in_path(env, host, cwd, spec.path_name, None, true)
}

/// Candidate locations for step 5, in search order.
pub fn fallback_candidates(env: &dyn Env, host: &HostFlags, spec: &ToolSpec) -> Vec<PathBuf> {
    let mut result = Vec::new();
    if host.windows {
        if host.native_windows
            && let Some(extra) = spec.windows_extra
            && let Some(path) = extra()
        {
            result.push(path);
        }
        for var in WINDOWS_ENV_PATHS {
            if let Some(root) = env.var(var) {
                for suffix in spec.program_files_suffixes {
                    result.push(PathBuf::from(convert_from_windows_path(&format!(
                        "{}{}",
                        root, suffix
                    ))));
                }
            }
        }
    } else if host.mac {
        result.extend(spec.mac_paths.iter().map(PathBuf::from));
    }
    if host.linux {
        result.extend(spec.linux_paths.iter().map(PathBuf::from));
    }
    result
}

/// Step 5: the first executable candidate.
pub fn from_fallbacks(candidates: Vec<PathBuf>) -> Option<PathBuf> {
    candidates.into_iter().find(|p| is_exe(p))
}

// ---------------------------------------------------------------------------
// Locator
// ---------------------------------------------------------------------------

/// Owns the tool cache and the environment lookups read from.
#[derive(Debug)]
pub struct Locator<E: Env = SystemEnv> {
    env: E,
    host: HostFlags,
    cwd: Option<PathBuf>,
    cache: ToolCache,
    visual_studios: Option<Vec<VisualStudioInstance>>,
}

impl Locator<SystemEnv> {
    /// A locator for the running process.
    pub fn new() -> Self {
        Self::with_env(SystemEnv, HostFlags::detect())
    }
}

impl Default for Locator<SystemEnv> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Env> Locator<E> {
    pub fn with_env(env: E, host: HostFlags) -> Self {
        Self {
            env,
            host,
            cwd: None,
            cache: ToolCache::new(),
            visual_studios: None,
        }
    }

    /// Search from `dir` instead of the process working directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn host(&self) -> &HostFlags {
        &self.host
    }

    pub fn cache(&self) -> &ToolCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ToolCache {
        &mut self.cache
    }

    pub fn working_dir(&self) -> PathBuf {
        self.cwd
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Apply `refresh` and `path`, then return any cached value.
    fn prepare(&mut self, tool: Tool, opts: &LookupOptions) -> Option<PathBuf> {
        if opts.refresh {
            self.cache.invalidate(tool);
        }
        if let Some(path) = &opts.path {
            self.cache.set(tool, path.clone());
        }
        self.cache.get(tool).map(Path::to_path_buf)
    }

    /// Run the full lookup chain for `spec`.
    pub fn locate(&mut self, spec: &ToolSpec, opts: &LookupOptions) -> Option<PathBuf> {
        if let Some(cached) = self.prepare(spec.tool, opts) {
            return Some(cached);
        }

        let cwd = self.working_dir();
        let env: &dyn Env = &self.env;
        let host = self.host;
        let strategies: [&dyn Fn() -> Option<PathBuf>; 3] = [
            &|| from_env_var(env, &host, spec),
            &|| from_search_path(env, &host, &cwd, spec),
            &|| from_fallbacks(fallback_candidates(env, &host, spec)),
        ];
        let found = strategies.iter().find_map(|strategy| strategy());

        match found {
            Some(path) => {
                self.cache.set(spec.tool, path.clone());
                Some(path)
            }
            None => {
                if opts.verbose {
                    println!("{} {} not found!", "x".red(), spec.display);
                    if self.host.mac
                        && let Some(hint) = spec.mac_hint
                    {
                        println!("{} {}", "ℹ".blue(), hint);
                    }
                }
                None
            }
        }
    }

    /// Root folder of third party SDKs.
    ///
    /// Uses `BURGER_SDKS`, or else the nearest `sdks` directory at or above
    /// the working directory.
    pub fn get_sdks_folder(&mut self, opts: &LookupOptions) -> Option<PathBuf> {
        if let Some(cached) = self.prepare(Tool::BurgerSdks, opts) {
            return Some(cached);
        }
        if let Some(value) = self.env.var("BURGER_SDKS") {
            let path = PathBuf::from(convert_from_windows_path(&value));
            self.cache.set(Tool::BurgerSdks, path.clone());
            return Some(path);
        }
        if opts.verbose {
            println!(
                "{} The environment variable \"BURGER_SDKS\" is not set",
                "!".yellow()
            );
        }
        let cwd = self.working_dir();
        let found = traverse_directory(&cwd, &["sdks"], true, true)
            .ok()
            .and_then(|list| list.into_iter().next())?;
        if opts.verbose {
            println!(
                "{} Assuming {} is the BURGER_SDKS folder",
                "ℹ".blue(),
                found.display()
            );
        }
        self.cache.set(Tool::BurgerSdks, found.clone());
        Some(found)
    }

    /// Registry scan results, cached until `refresh`.
    pub fn find_visual_studios(&mut self, refresh: bool) -> &[VisualStudioInstance] {
        if refresh || self.visual_studios.as_ref().is_none_or(Vec::is_empty) {
            let found = if self.host.windows {
                windows::scan_system()
            } else {
                Vec::new()
            };
            self.visual_studios = Some(found);
        }
        self.visual_studios.as_deref().unwrap_or(&[])
    }

    /// Replace the Visual Studio cache, used when scanning a custom registry.
    pub fn set_visual_studios(&mut self, instances: Vec<VisualStudioInstance>) {
        self.visual_studios = Some(instances);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::{Path, PathBuf};

    /// Create an executable file (mode 755 on Unix).
    pub fn make_exe(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::make_exe;
    use super::*;
    use tempfile::TempDir;

    fn spec() -> ToolSpec {
        tools::PERFORCE
    }

    #[test]
    fn test_override_path_sticks_until_refresh() {
        let mut locator = Locator::with_env(MemoryEnv::new(), HostFlags::linux());
        let custom = PathBuf::from("/custom/p4");
        let found = locator.locate(&spec(), &LookupOptions {
            refresh: true,
            path: Some(custom.clone()),
            verbose: false,
        });
        assert_eq!(found.as_deref(), Some(custom.as_path()));
        for _ in 0..3 {
            assert_eq!(
                locator.locate(&spec(), &LookupOptions::default()).as_deref(),
                Some(custom.as_path())
            );
        }
        locator.cache_mut().invalidate(Tool::Perforce);
        assert_eq!(locator.cache().get(Tool::Perforce), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_env_var_wins() {
        let dir = TempDir::new().unwrap();
        let p4 = make_exe(dir.path(), "p4");
        let env = MemoryEnv::new().with("PERFORCE", dir.path().to_string_lossy());
        let mut locator = Locator::with_env(env, HostFlags::linux());
        assert_eq!(locator.locate(&spec(), &LookupOptions::default()), Some(p4.clone()));
        assert_eq!(locator.cache().get(Tool::Perforce), Some(p4.as_path()));
    }

    #[cfg(unix)]
    #[test]
    fn test_env_var_must_be_executable() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("p4"), "").unwrap();
        let env = MemoryEnv::new().with("PERFORCE", dir.path().to_string_lossy());
        assert_eq!(from_env_var(&env, &HostFlags::linux(), &spec()), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_search_path_and_dedup() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let git = make_exe(second.path(), "git");
        let joined = std::env::join_paths([first.path(), first.path(), second.path()]).unwrap();
        let env = MemoryEnv::new().with("PATH", joined.to_string_lossy());
        let found = find_in_path(&env, &HostFlags::linux(), Path::new("."), "git", None, true);
        assert_eq!(found, Some(git));
    }

    #[cfg(unix)]
    #[test]
    fn test_find_in_path_non_executable() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("data.txt"), "x").unwrap();
        let env = MemoryEnv::new();
        let list = vec![dir.path().to_path_buf()];
        let host = HostFlags::linux();
        assert!(find_in_path(&env, &host, Path::new("."), "data.txt", Some(&list), false).is_some());
        assert!(find_in_path(&env, &host, Path::new("."), "data.txt", Some(&list), true).is_none());
    }

    #[test]
    fn test_default_search_path_uses_system_root() {
        let env = MemoryEnv::new().with("SystemRoot", "D:\\Win");
        let native = HostFlags::windows();
        let dirs = default_search_path(&env, &native);
        assert_eq!(dirs.len(), 2);
        assert!(dirs[0].to_string_lossy().ends_with("System32"));
        assert_eq!(
            default_search_path(&env, &HostFlags::linux()),
            vec![PathBuf::from("/bin"), PathBuf::from("/usr/bin")]
        );
    }

    #[test]
    fn test_get_path_ext() {
        let env = MemoryEnv::new();
        assert!(get_path_ext(&env, &HostFlags::linux(), None).is_empty());
        let wsl = HostFlags {
            windows: true,
            native_windows: false,
            mac: false,
            linux: true,
        };
        assert_eq!(get_path_ext(&env, &wsl, None), vec![".EXE"]);
        assert_eq!(
            get_path_ext(&env, &HostFlags::linux(), Some(".COM;.EXE")),
            vec![".COM", ".EXE"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_make_exe_path() {
        let dir = TempDir::new().unwrap();
        let exe = make_exe(dir.path(), "tool.exe");
        let base = dir.path().join("tool");
        let ext = vec![".COM".to_string(), ".exe".to_string()];
        assert_eq!(make_exe_path(&base, &ext), Some(exe.clone()));
        assert_eq!(make_exe_path(&exe, &ext), Some(exe));
        assert_eq!(make_exe_path(&base, &[]), None);
    }

    #[test]
    fn test_expand_vars() {
        let env = MemoryEnv::new().with("ROOT", "/opt").with("X", "y");
        assert_eq!(expand_vars(&env, "${ROOT}/bin/$X"), "/opt/bin/y");
        assert_eq!(expand_vars(&env, "$MISSING/a"), "$MISSING/a");
    }

    #[test]
    fn test_fallback_candidates_per_host() {
        let env = MemoryEnv::new()
            .with("ProgramFiles", "C:\\Program Files")
            .with("ProgramFiles(x86)", "C:\\Program Files (x86)");
        let linux = fallback_candidates(&env, &HostFlags::linux(), &spec());
        assert_eq!(linux, vec![PathBuf::from("/usr/bin/p4")]);
        let mac = fallback_candidates(&env, &HostFlags::mac(), &spec());
        assert_eq!(mac, vec![PathBuf::from("/opt/local/bin/p4")]);
        let win = fallback_candidates(&env, &HostFlags::windows(), &spec());
        assert_eq!(win.len(), 2);
        assert!(win[0].to_string_lossy().ends_with("perforce\\p4.exe"));
    }

    #[test]
    fn test_fix_csharp() {
        assert_eq!(fix_csharp(&HostFlags::windows(), "a b.exe"), vec!["a b.exe"]);
        assert_eq!(fix_csharp(&HostFlags::linux(), "a.exe"), vec!["mono", "a.exe"]);
    }

    #[test]
    fn test_codewarrior_release_check() {
        assert!(codewarrior_allowed_for("10.6.8"));
        assert!(!codewarrior_allowed_for("10.7"));
        assert!(!codewarrior_allowed_for("14.2"));
        assert!(!codewarrior_allowed_for("junk"));
    }

    #[test]
    fn test_sdks_folder_from_env() {
        let env = MemoryEnv::new().with("BURGER_SDKS", "/sdks/root");
        let mut locator = Locator::with_env(env, HostFlags::linux());
        assert_eq!(
            locator.get_sdks_folder(&LookupOptions::default()),
            Some(PathBuf::from("/sdks/root"))
        );
    }

    #[test]
    fn test_sdks_folder_from_parent_directory() {
        let dir = TempDir::new().unwrap();
        let sdks = dir.path().join("sdks");
        let deep = dir.path().join("a").join("b");
        std::fs::create_dir_all(&sdks).unwrap();
        std::fs::create_dir_all(&deep).unwrap();
        let mut locator =
            Locator::with_env(MemoryEnv::new(), HostFlags::linux()).with_working_dir(&deep);
        assert_eq!(locator.get_sdks_folder(&LookupOptions::default()), Some(sdks));
    }
}
