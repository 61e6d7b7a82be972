use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// External tools whose location is cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tool {
    BurgerSdks,
    Perforce,
    Git,
    Doxygen,
    Watcom,
    CodeBlocks,
    PdfLatex,
    MakeIndex,
}

impl Tool {
    pub const ALL: [Tool; 8] = [
        Tool::BurgerSdks,
        Tool::Perforce,
        Tool::Git,
        Tool::Doxygen,
        Tool::Watcom,
        Tool::CodeBlocks,
        Tool::PdfLatex,
        Tool::MakeIndex,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Tool::BurgerSdks => "sdks",
            Tool::Perforce => "p4",
            Tool::Git => "git",
            Tool::Doxygen => "doxygen",
            Tool::Watcom => "watcom",
            Tool::CodeBlocks => "codeblocks",
            Tool::PdfLatex => "pdflatex",
            Tool::MakeIndex => "makeindex",
        }
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        let lower = name.to_ascii_lowercase();
        Tool::ALL.into_iter().find(|t| t.name() == lower).or(match lower.as_str() {
            "perforce" => Some(Tool::Perforce),
            "burger_sdks" => Some(Tool::BurgerSdks),
            _ => None,
        })
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Remembered tool locations.
///
/// Entries live until explicitly invalidated, there is no expiry.
#[derive(Debug, Clone, Default)]
pub struct ToolCache {
    paths: HashMap<Tool, PathBuf>,
}

impl ToolCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tool: Tool) -> Option<&Path> {
        self.paths.get(&tool).map(PathBuf::as_path)
    }

    pub fn set(&mut self, tool: Tool, path: impl Into<PathBuf>) {
        self.paths.insert(tool, path.into());
    }

    pub fn invalidate(&mut self, tool: Tool) {
        self.paths.remove(&tool);
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }
}

/// Options shared by every `where_is_*` lookup.
#[derive(Debug, Clone, Default)]
pub struct LookupOptions {
    /// Print a diagnostic when the tool isn't found
    pub verbose: bool,
    /// Drop the cached location before searching
    pub refresh: bool,
    /// Use this path and cache it
    pub path: Option<PathBuf>,
}

impl LookupOptions {
    pub fn verbose() -> Self {
        Self {
            verbose: true,
            ..Default::default()
        }
    }

    pub fn refresh() -> Self {
        Self {
            refresh: true,
            ..Default::default()
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }
}

/// Source of environment variables.
pub trait Env {
    /// Value of `key`, `None` when unset or empty.
    fn var(&self, key: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl Env for SystemEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }
}

/// A fixed set of variables, used to run lookups against a known state.
#[derive(Debug, Clone, Default)]
pub struct MemoryEnv {
    vars: HashMap<String, String>,
}

impl MemoryEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.vars.insert(key.to_string(), value.into());
    }
}

impl Env for MemoryEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).filter(|v| !v.is_empty()).cloned()
    }
}

/// Which platform specific search rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostFlags {
    /// Windows, or Linux running under Windows
    pub windows: bool,
    /// Native Windows build
    pub native_windows: bool,
    pub mac: bool,
    pub linux: bool,
}

impl HostFlags {
    /// Flags for the machine this binary runs on.
    pub fn detect() -> Self {
        Self {
            windows: crate::strutils::get_windows_host_type(true).is_some(),
            native_windows: cfg!(windows),
            mac: crate::strutils::get_mac_host_type().is_some(),
            linux: cfg!(target_os = "linux"),
        }
    }

    pub fn linux() -> Self {
        Self {
            windows: false,
            native_windows: false,
            mac: false,
            linux: true,
        }
    }

    pub fn mac() -> Self {
        Self {
            windows: false,
            native_windows: false,
            mac: true,
            linux: false,
        }
    }

    pub fn windows() -> Self {
        Self {
            windows: true,
            native_windows: true,
            mac: false,
            linux: false,
        }
    }
}

/// What a [`VisualStudioInstance`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceKind {
    VisualStudio,
    WindowsSdk,
}

/// A Visual Studio install or a Windows SDK found in the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualStudioInstance {
    pub kind: InstanceKind,
    pub name: String,
    pub version_string: String,
    pub version_info: Vec<i64>,
    /// Install folder without trailing slashes
    pub path: PathBuf,
    /// Logical tool name (`cl.exe_x86`, `WinSDK.um`, ...) to its location
    pub known_paths: BTreeMap<String, PathBuf>,
}

impl VisualStudioInstance {
    pub fn new(
        kind: InstanceKind,
        name: impl Into<String>,
        version_string: impl Into<String>,
        path: &str,
        known_paths: BTreeMap<String, PathBuf>,
    ) -> Self {
        let version_string = version_string.into();
        let trimmed = path.trim_end_matches(['\\', '/']);
        Self {
            kind,
            name: name.into(),
            version_info: crate::strutils::make_version_tuple(&version_string),
            version_string,
            path: PathBuf::from(if trimmed.is_empty() { path } else { trimmed }),
            known_paths,
        }
    }

    pub fn known_path(&self, key: &str) -> Option<&Path> {
        self.known_paths.get(key).map(PathBuf::as_path)
    }
}

impl std::fmt::Display for VisualStudioInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
