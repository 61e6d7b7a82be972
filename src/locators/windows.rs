//! Visual Studio and Windows SDK discovery from the registry.
//!
//! Scanning is written against [`RegistryKey`] and [`FileProbe`] so the same
//! code runs on a live system (`winreg`, the disk) and on in-memory fixtures.
//! Paths stay in Windows form (`C:\...`) throughout.

use super::types::{InstanceKind, VisualStudioInstance};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Known paths where vswhere.exe might be located
const VSWHERE_PATHS: &[&str] = &[
    r"C:\Program Files (x86)\Microsoft Visual Studio\Installer\vswhere.exe",
    r"C:\Program Files\Microsoft Visual Studio\Installer\vswhere.exe",
];

/// Read-only view of a registry key.
pub trait RegistryKey {
    /// Open a descendant key, `path` separated by backslashes.
    fn subkey(&self, path: &str) -> Option<Box<dyn RegistryKey>>;
    /// A string value of this key.
    fn value(&self, name: &str) -> Option<String>;
    fn subkey_names(&self) -> Vec<String>;
}

/// Filesystem checks used while scanning.
pub trait FileProbe {
    fn exists(&self, path: &str) -> bool;
    /// Names of the directories inside `path`.
    fn list_dirs(&self, path: &str) -> Vec<String>;
}

/// Probe the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskProbe;

impl FileProbe for DiskProbe {
    fn exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }

    fn list_dirs(&self, path: &str) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(path) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// An in-memory registry tree. Key names match case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct MemoryKey {
    values: BTreeMap<String, String>,
    children: Vec<(String, MemoryKey)>,
}

impl MemoryKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value` on the key at `path`, creating keys as needed.
    pub fn with(mut self, path: &str, name: &str, value: &str) -> Self {
        self.insert(path, name, value);
        self
    }

    pub fn insert(&mut self, path: &str, name: &str, value: &str) {
        let mut node = self;
        for part in path.split('\\').filter(|p| !p.is_empty()) {
            let index = match node
                .children
                .iter()
                .position(|(n, _)| n.eq_ignore_ascii_case(part))
            {
                Some(i) => i,
                None => {
                    node.children.push((part.to_string(), MemoryKey::new()));
                    node.children.len() - 1
                }
            };
            node = &mut node.children[index].1;
        }
        node.values.insert(name.to_string(), value.to_string());
    }

    fn find(&self, path: &str) -> Option<&MemoryKey> {
        let mut node = self;
        for part in path.split('\\').filter(|p| !p.is_empty()) {
            node = node
                .children
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(part))
                .map(|(_, k)| k)?;
        }
        Some(node)
    }
}

impl RegistryKey for MemoryKey {
    fn subkey(&self, path: &str) -> Option<Box<dyn RegistryKey>> {
        self.find(path)
            .map(|k| Box::new(k.clone()) as Box<dyn RegistryKey>)
    }

    fn value(&self, name: &str) -> Option<String> {
        self.values
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    fn subkey_names(&self) -> Vec<String> {
        self.children.iter().map(|(n, _)| n.clone()).collect()
    }
}

#[cfg(windows)]
impl RegistryKey for winreg::RegKey {
    fn subkey(&self, path: &str) -> Option<Box<dyn RegistryKey>> {
        use winreg::enums::*;
        winreg::RegKey::open_subkey_with_flags(self, path, KEY_READ | KEY_WOW64_32KEY)
            .ok()
            .map(|k| Box::new(k) as Box<dyn RegistryKey>)
    }

    fn value(&self, name: &str) -> Option<String> {
        winreg::RegKey::get_value::<String, _>(self, name).ok()
    }

    fn subkey_names(&self) -> Vec<String> {
        self.enum_keys().filter_map(Result::ok).collect()
    }
}

/// One installation reported by `vswhere`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VsWhereEntry {
    pub installation_path: String,
    pub display_name: String,
    pub installation_version: String,
}

/// Parse vswhere JSON output
pub fn parse_vswhere_output(json_str: &str) -> Vec<VsWhereEntry> {
    let Ok(installations) = serde_json::from_str::<Vec<serde_json::Value>>(json_str) else {
        return Vec::new();
    };
    installations
        .iter()
        .filter_map(|inst| {
            let field = |name: &str| inst.get(name)?.as_str().map(str::to_string);
            Some(VsWhereEntry {
                installation_path: field("installationPath")?,
                display_name: field("displayName").unwrap_or_default(),
                installation_version: field("installationVersion").unwrap_or_default(),
            })
        })
        .collect()
}

/// Ask vswhere.exe for every installed product.
pub fn query_vswhere() -> Vec<VsWhereEntry> {
    let Some(vswhere) = VSWHERE_PATHS.iter().find(|p| Path::new(p).exists()) else {
        return Vec::new();
    };
    let result = crate::run::run_command(
        &[*vswhere, "-all", "-format", "json", "-utf8", "-products", "*"],
        None,
        true,
        true,
        true,
    );
    if !result.success() {
        return Vec::new();
    }
    parse_vswhere_output(&result.stdout)
}

/// Join Windows path fragments with a single backslash.
fn win_join(base: &str, rest: &str) -> String {
    format!("{}\\{}", base.trim_end_matches('\\'), rest.trim_start_matches('\\'))
}

/// Drop the last `count` components of a Windows path.
fn win_parent(path: &str, count: usize) -> Option<String> {
    let parts: Vec<&str> = path.trim_end_matches('\\').split('\\').collect();
    (parts.len() > count).then(|| parts[..parts.len() - count].join("\\"))
}

struct Known<'a> {
    probe: &'a dyn FileProbe,
    paths: BTreeMap<String, PathBuf>,
}

impl<'a> Known<'a> {
    fn new(probe: &'a dyn FileProbe) -> Self {
        Self {
            probe,
            paths: BTreeMap::new(),
        }
    }

    /// Record `path` under `key` if it exists.
    fn add(&mut self, key: impl Into<String>, path: String) {
        if self.probe.exists(&path) {
            self.paths.insert(key.into(), PathBuf::from(path));
        }
    }

    fn into_paths(self) -> BTreeMap<String, PathBuf> {
        self.paths
    }
}

const LEGACY_VS: &[(&str, &str)] = &[
    ("7.1", "Visual Studio 2003"),
    ("8.0", "Visual Studio 2005"),
    ("9.0", "Visual Studio 2008"),
    ("10.0", "Visual Studio 2010"),
    ("11.0", "Visual Studio 2012"),
    ("12.0", "Visual Studio 2013"),
    ("14.0", "Visual Studio 2015"),
];

/// Visual Studio 2003 through 2015, registered under `SxS\VS7`.
pub fn scan_legacy_visual_studio(
    microsoft: &dyn RegistryKey,
    probe: &dyn FileProbe,
) -> Vec<VisualStudioInstance> {
    let Some(vs7) = microsoft.subkey("VisualStudio\\SxS\\VS7") else {
        return Vec::new();
    };
    let vc7 = microsoft.subkey("VisualStudio\\SxS\\VC7");
    let msbuild = microsoft.subkey("MSBuild\\ToolsVersions");

    let mut result = Vec::new();
    for &(key, name) in LEGACY_VS {
        let Some(base) = vs7.value(key) else {
            continue;
        };
        let mut known = Known::new(probe);
        let ide = win_join(&base, "Common7\\IDE");
        for exe in ["devenv.exe", "devenv.com"] {
            known.add(format!("{}_x86", exe), win_join(&ide, exe));
        }

        let vc = vc7.as_ref().and_then(|k| k.value(key));
        if key == "7.1" {
            known.add(
                "vsvars32.bat",
                win_join(&base, "Common7\\Tools\\vsvars32.bat"),
            );
        } else if let Some(vc) = &vc {
            known.add("vcvarsall.bat", win_join(vc, "vcvarsall.bat"));
        }
        if let Some(vc) = &vc {
            for exe in ["cl.exe", "link.exe", "lib.exe"] {
                known.add(format!("{}_x86", exe), win_join(vc, &format!("bin\\{}", exe)));
            }
        }
        if let Some(tools) = msbuild
            .as_ref()
            .and_then(|k| k.subkey(key))
            .and_then(|k| k.value("MSBuildToolsPath"))
        {
            known.add("msbuild.exe_x86", win_join(&tools, "msbuild.exe"));
        }

        result.push(VisualStudioInstance::new(
            InstanceKind::VisualStudio,
            name,
            key,
            &base,
            known.into_paths(),
        ));
    }
    result
}

/// Visual Studio 2017 and later, registered as `VisualStudio_*` applications.
pub fn scan_modern_visual_studio(
    microsoft: &dyn RegistryKey,
    vswhere: &[VsWhereEntry],
    probe: &dyn FileProbe,
) -> Vec<VisualStudioInstance> {
    let mut result: Vec<VisualStudioInstance> = Vec::new();
    for sub in microsoft.subkey_names() {
        if !sub.starts_with("VisualStudio_") {
            continue;
        }
        let Some(description) = microsoft
            .subkey(&format!("{}\\Capabilities", sub))
            .and_then(|k| k.value("ApplicationDescription"))
        else {
            continue;
        };
        // "@C:\...\Common7\IDE\devenv.exe,-1004"
        let trimmed = description.trim_start_matches('@');
        let devenv = trimmed.rsplit_once(',').map_or(trimmed, |(path, _)| path);
        let Some(base) = win_parent(devenv, 3) else {
            continue;
        };
        if result
            .iter()
            .any(|i| i.path.to_string_lossy().eq_ignore_ascii_case(&base))
        {
            continue;
        }

        let entry = vswhere
            .iter()
            .find(|e| e.installation_path.trim_end_matches('\\').eq_ignore_ascii_case(&base));
        let (name, version) = match entry {
            Some(e) => (e.display_name.clone(), e.installation_version.clone()),
            None => (name_from_install_path(&base), String::new()),
        };

        let mut known = Known::new(probe);
        let ide = win_join(&base, "Common7\\IDE");
        for exe in ["devenv.exe", "devenv.com"] {
            known.add(format!("{}_x86", exe), win_join(&ide, exe));
        }
        known.add(
            "vcvarsall.bat",
            win_join(&base, "VC\\Auxiliary\\Build\\vcvarsall.bat"),
        );
        let major = version.split('.').next().unwrap_or("");
        let versioned = win_join(&base, &format!("MSBuild\\{}.0\\Bin\\MSBuild.exe", major));
        let msbuild = if !major.is_empty() && probe.exists(&versioned) {
            versioned
        } else {
            win_join(&base, "MSBuild\\Current\\Bin\\MSBuild.exe")
        };
        known.add("msbuild.exe_x86", msbuild);

        result.push(VisualStudioInstance::new(
            InstanceKind::VisualStudio,
            name,
            version,
            &base,
            known.into_paths(),
        ));
    }
    result
}

/// "Visual Studio 2022 Community" from `...\2022\Community`.
fn name_from_install_path(base: &str) -> String {
    let mut parts = base.rsplit('\\');
    match (parts.next(), parts.next()) {
        (Some(edition), Some(year)) => format!("Visual Studio {} {}", year, edition),
        _ => "Visual Studio".to_string(),
    }
}

const SDK_TOOLS: &[&str] = &["rc.exe", "mt.exe", "signtool.exe", "makecat.exe", "midl.exe", "mc.exe"];

/// Platform SDKs that shipped inside Visual Studio 2003 and 2005.
pub fn scan_windows5_sdk(
    microsoft: &dyn RegistryKey,
    probe: &dyn FileProbe,
) -> Vec<VisualStudioInstance> {
    let Some(vc7) = microsoft.subkey("VisualStudio\\SxS\\VC7") else {
        return Vec::new();
    };
    let mut result = Vec::new();
    for (key, version) in [("7.1", "5.0"), ("8.0", "5.1")] {
        let Some(vc) = vc7.value(key) else {
            continue;
        };
        let sdk = win_join(&vc, "PlatformSDK");
        if !probe.exists(&sdk) {
            continue;
        }
        let mut known = Known::new(probe);
        known.add("WinSDK.um", win_join(&sdk, "Include"));
        known.add("WinSDK.lib_x86", win_join(&sdk, "Lib"));
        known.add("WinSDK.lib_x64", win_join(&sdk, "Lib\\AMD64"));
        for exe in SDK_TOOLS {
            known.add(format!("{}_x86", exe), win_join(&sdk, &format!("Bin\\{}", exe)));
        }
        result.push(VisualStudioInstance::new(
            InstanceKind::WindowsSdk,
            "Windows 5 SDK",
            version,
            &sdk,
            known.into_paths(),
        ));
    }
    result
}

/// Product version of a `Microsoft SDKs\Windows` entry.
fn sdk_product_version(key: &dyn RegistryKey) -> Option<String> {
    key.value("ProductVersion").or_else(|| {
        ["VistaClientWin32Tools", "VistaClientSDKTools"]
            .iter()
            .find_map(|sub| key.subkey(sub).and_then(|k| k.value("ProductVersion")))
    })
}

/// Windows 6.0A, 7.0A and 7.1A SDKs.
pub fn scan_windows7_sdk(
    microsoft: &dyn RegistryKey,
    probe: &dyn FileProbe,
) -> Vec<VisualStudioInstance> {
    let Some(sdks) = microsoft.subkey("Microsoft SDKs\\Windows") else {
        return Vec::new();
    };
    let mut result = Vec::new();
    for (key, name) in [
        ("v6.0A", "Windows 6 SDK"),
        ("v7.0A", "Windows 7 SDK"),
        ("v7.1A", "Windows 7 SDK"),
    ] {
        let Some(entry) = sdks.subkey(key) else {
            continue;
        };
        let Some(folder) = entry.value("InstallationFolder") else {
            continue;
        };
        let version = sdk_product_version(entry.as_ref())
            .unwrap_or_else(|| key.trim_start_matches('v').to_string());

        let mut known = Known::new(probe);
        known.add("WinSDK.um", win_join(&folder, "Include"));
        known.add("WinSDK.lib_x86", win_join(&folder, "Lib"));
        known.add("WinSDK.lib_x64", win_join(&folder, "Lib\\x64"));
        for exe in SDK_TOOLS {
            known.add(format!("{}_x86", exe), win_join(&folder, &format!("bin\\{}", exe)));
            known.add(format!("{}_x64", exe), win_join(&folder, &format!("bin\\x64\\{}", exe)));
        }
        result.push(VisualStudioInstance::new(
            InstanceKind::WindowsSdk,
            name,
            version,
            &folder,
            known.into_paths(),
        ));
    }
    result
}

/// Windows 8.0 and 8.1 kits.
pub fn scan_windows8_sdk(
    microsoft: &dyn RegistryKey,
    probe: &dyn FileProbe,
) -> Vec<VisualStudioInstance> {
    let Some(roots) = microsoft.subkey("Windows Kits\\Installed Roots") else {
        return Vec::new();
    };
    let sdks = microsoft.subkey("Microsoft SDKs\\Windows");
    let mut result = Vec::new();
    for (value, default_version, sdk_key, lib_dir, name) in [
        ("KitsRoot", "8.0", "v8.0A", "win8", "Windows 8 SDK"),
        ("KitsRoot81", "8.1", "v8.1A", "winv6.3", "Windows 8.1 SDK"),
    ] {
        let Some(root) = roots.value(value) else {
            continue;
        };
        let version = sdks
            .as_ref()
            .and_then(|k| k.subkey(sdk_key))
            .and_then(|k| k.value("ProductVersion"))
            .unwrap_or_else(|| default_version.to_string());

        let mut known = Known::new(probe);
        for header in ["um", "shared", "winrt"] {
            known.add(
                format!("WinSDK.{}", header),
                win_join(&root, &format!("Include\\{}", header)),
            );
        }
        for cpu in ["x86", "x64", "arm"] {
            known.add(
                format!("WinSDK.lib_{}", cpu),
                win_join(&root, &format!("Lib\\{}\\um\\{}", lib_dir, cpu)),
            );
        }
        for cpu in ["x86", "x64"] {
            for exe in SDK_TOOLS {
                known.add(
                    format!("{}_{}", exe, cpu),
                    win_join(&root, &format!("bin\\{}\\{}", cpu, exe)),
                );
            }
        }
        result.push(VisualStudioInstance::new(
            InstanceKind::WindowsSdk,
            name,
            version,
            &root,
            known.into_paths(),
        ));
    }
    result
}

/// Every Windows 10 kit version found under `Include`.
pub fn scan_windows10_sdk(
    microsoft: &dyn RegistryKey,
    probe: &dyn FileProbe,
) -> Vec<VisualStudioInstance> {
    let Some(root) = microsoft
        .subkey("Windows Kits\\Installed Roots")
        .and_then(|k| k.value("KitsRoot10"))
    else {
        return Vec::new();
    };
    let mut result = Vec::new();
    for version in probe.list_dirs(&win_join(&root, "Include")) {
        if crate::strutils::make_version_tuple(&version).first() != Some(&10) {
            continue;
        }
        let mut known = Known::new(probe);
        for header in ["ucrt", "um", "shared", "winrt", "cppwinrt"] {
            known.add(
                format!("WinSDK.{}", header),
                win_join(&root, &format!("Include\\{}\\{}", version, header)),
            );
        }
        for cpu in ["x86", "x64", "arm", "arm64"] {
            known.add(
                format!("WinSDK.libucrt_{}", cpu),
                win_join(&root, &format!("Lib\\{}\\ucrt\\{}", version, cpu)),
            );
            known.add(
                format!("WinSDK.lib_{}", cpu),
                win_join(&root, &format!("Lib\\{}\\um\\{}", version, cpu)),
            );
        }
        for cpu in ["x86", "x64", "arm64"] {
            for exe in ["rc.exe", "signtool.exe", "makecat.exe", "midl.exe", "mc.exe"] {
                let versioned = win_join(&root, &format!("bin\\{}\\{}\\{}", version, cpu, exe));
                let path = if probe.exists(&versioned) {
                    versioned
                } else {
                    win_join(&root, &format!("bin\\{}\\{}", cpu, exe))
                };
                known.add(format!("{}_{}", exe, cpu), path);
            }
        }
        result.push(VisualStudioInstance::new(
            InstanceKind::WindowsSdk,
            "Windows 10 SDK",
            version.as_str(),
            &root,
            known.into_paths(),
        ));
    }
    result
}

/// Every Visual Studio and Windows SDK below `Software\Microsoft`.
pub fn scan(
    microsoft: &dyn RegistryKey,
    vswhere: &[VsWhereEntry],
    probe: &dyn FileProbe,
) -> Vec<VisualStudioInstance> {
    let mut result = scan_legacy_visual_studio(microsoft, probe);
    result.extend(scan_modern_visual_studio(microsoft, vswhere, probe));
    result.extend(scan_windows5_sdk(microsoft, probe));
    result.extend(scan_windows7_sdk(microsoft, probe));
    result.extend(scan_windows8_sdk(microsoft, probe));
    result.extend(scan_windows10_sdk(microsoft, probe));
    result
}

/// Scan the live registry. Empty when the registry can't be read.
#[cfg(windows)]
pub fn scan_system() -> Vec<VisualStudioInstance> {
    use winreg::RegKey;
    use winreg::enums::*;

    let Ok(microsoft) = RegKey::predef(HKEY_LOCAL_MACHINE)
        .open_subkey_with_flags("Software\\Microsoft", KEY_READ | KEY_WOW64_32KEY)
    else {
        return Vec::new();
    };
    scan(&microsoft, &query_vswhere(), &DiskProbe)
}

#[cfg(not(windows))]
pub fn scan_system() -> Vec<VisualStudioInstance> {
    Vec::new()
}

/// CodeBlocks install recorded by its installer.
#[cfg(windows)]
pub fn codeblocks_registry_path() -> Option<PathBuf> {
    use winreg::RegKey;
    use winreg::enums::*;

    let key = RegKey::predef(HKEY_CURRENT_USER)
        .open_subkey_with_flags("SOFTWARE\\CodeBlocks", KEY_READ | KEY_WOW64_32KEY)
        .ok()?;
    let folder: String = key.get_value("Path").ok()?;
    Some(PathBuf::from(win_join(&folder, "codeblocks.exe")))
}

#[cfg(not(windows))]
pub fn codeblocks_registry_path() -> Option<PathBuf> {
    None
}
