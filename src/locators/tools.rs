//! Per-tool search tables and the `where_is_*` entry points.

use super::{Env, Locator, LookupOptions, Tool, ToolSpec, WINDOWS_ENV_PATHS, is_exe};
use crate::strutils::{convert_from_windows_path, normalize_path};
use colored::*;
use std::path::{Path, PathBuf};

pub const PERFORCE: ToolSpec = ToolSpec {
    tool: Tool::Perforce,
    display: "Perforce \"p4\"",
    env_var: Some("PERFORCE"),
    env_suffixes_windows: &["\\p4.exe"],
    env_suffixes_posix: &["/p4"],
    path_name: "p4",
    program_files_suffixes: &["\\perforce\\p4.exe"],
    mac_paths: &["/opt/local/bin/p4"],
    linux_paths: &["/usr/bin/p4"],
    windows_extra: None,
    mac_hint: Some("Use brew or macports for the command line version"),
};

pub const GIT: ToolSpec = ToolSpec {
    tool: Tool::Git,
    display: "git",
    env_var: Some("GIT"),
    env_suffixes_windows: &["\\git.exe", "\\bin\\git.exe"],
    env_suffixes_posix: &["/git"],
    path_name: "git",
    program_files_suffixes: &["\\git\\bin\\git.exe"],
    mac_paths: &["/opt/local/bin/git"],
    linux_paths: &["/usr/bin/git"],
    windows_extra: None,
    mac_hint: Some("Use brew or macports for the command line version"),
};

pub const DOXYGEN: ToolSpec = ToolSpec {
    tool: Tool::Doxygen,
    display: "Doxygen",
    env_var: Some("DOXYGEN"),
    env_suffixes_windows: &["\\bin\\doxygen.exe"],
    env_suffixes_posix: &["/doxygen"],
    path_name: "doxygen",
    program_files_suffixes: &["\\doxygen\\bin\\doxygen.exe"],
    mac_paths: &[
        "/Applications/Doxygen.app/Contents/Resources/doxygen",
        "/opt/local/bin/doxygen",
    ],
    linux_paths: &["/usr/bin/doxygen"],
    windows_extra: None,
    mac_hint: Some(
        "Install the desktop application in the Applications folder \
         or use brew or macports for the command line version",
    ),
};

pub const CODEBLOCKS: ToolSpec = ToolSpec {
    tool: Tool::CodeBlocks,
    display: "CodeBlocks",
    env_var: Some("CODEBLOCKS"),
    env_suffixes_windows: &["\\codeblocks.exe"],
    env_suffixes_posix: &["/CodeBlocks"],
    path_name: "CodeBlocks",
    program_files_suffixes: &["\\CodeBlocks\\codeblocks.exe"],
    mac_paths: &[
        "/Applications/CodeBlocks.app/Contents/MacOS/CodeBlocks",
        "/opt/local/bin/CodeBlocks",
    ],
    linux_paths: &["/usr/bin/codeblocks", "/usr/bin/CodeBlocks"],
    windows_extra: Some(super::windows::codeblocks_registry_path),
    mac_hint: Some("Install the desktop application in the Applications folder"),
};

pub const PDFLATEX: ToolSpec = ToolSpec {
    tool: Tool::PdfLatex,
    display: "pdflatex",
    env_var: None,
    env_suffixes_windows: &[],
    env_suffixes_posix: &[],
    path_name: "pdflatex",
    program_files_suffixes: &["\\MiKTeX\\miktex\\bin\\x64\\pdflatex.exe"],
    mac_paths: &["/Library/TeX/texbin/pdflatex", "/opt/local/bin/pdflatex"],
    linux_paths: &["/usr/bin/pdflatex"],
    windows_extra: None,
    mac_hint: Some("Install MacTeX or use brew or macports for the command line version"),
};

pub const MAKEINDEX: ToolSpec = ToolSpec {
    tool: Tool::MakeIndex,
    display: "makeindex",
    env_var: None,
    env_suffixes_windows: &[],
    env_suffixes_posix: &[],
    path_name: "makeindex",
    program_files_suffixes: &["\\MiKTeX\\miktex\\bin\\x64\\makeindex.exe"],
    mac_paths: &["/Library/TeX/texbin/makeindex", "/opt/local/bin/makeindex"],
    linux_paths: &["/usr/bin/makeindex"],
    windows_extra: None,
    mac_hint: Some("Install MacTeX or use brew or macports for the command line version"),
};

/// Environment variable and folder name for each Visual Studio release.
///
/// `xxx` is replaced with each edition for 2017 and later.
const VS_TABLE: &[(u32, &str, &str)] = &[
    (2003, "VS71COMNTOOLS", "Microsoft Visual Studio .NET 2003"),
    (2005, "VS80COMNTOOLS", "Microsoft Visual Studio 8"),
    (2008, "VS90COMNTOOLS", "Microsoft Visual Studio 9.0"),
    (2010, "VS100COMNTOOLS", "Microsoft Visual Studio 10.0"),
    (2012, "VS110COMNTOOLS", "Microsoft Visual Studio 11.0"),
    (2013, "VS120COMNTOOLS", "Microsoft Visual Studio 12.0"),
    (2015, "VS140COMNTOOLS", "Microsoft Visual Studio 14.0"),
    (2017, "VS150COMNTOOLS", "Microsoft Visual Studio\\2017\\xxx"),
    (2019, "VS160COMNTOOLS", "Microsoft Visual Studio\\2019\\xxx"),
    (2022, "VS170COMNTOOLS", "Microsoft Visual Studio\\2022\\xxx"),
];

const VS_VARIANTS: [&str; 3] = ["Enterprise", "Professional", "Community"];

/// `Common7\Tools` folders that may hold a given Visual Studio release.
pub fn visual_studio_tool_dirs(env: &dyn Env, year: u32) -> Vec<String> {
    let Some(&(_, env_var, folder)) = VS_TABLE.iter().find(|(y, _, _)| *y == year) else {
        return Vec::new();
    };
    let mut result = Vec::new();
    if let Some(path) = env.var(env_var) {
        result.push(path);
    }
    for program_files in WINDOWS_ENV_PATHS {
        if let Some(root) = env.var(program_files) {
            if folder.contains("xxx") {
                for variant in VS_VARIANTS {
                    result.push(format!(
                        "{}\\{}\\Common7\\Tools\\",
                        root,
                        folder.replace("xxx", variant)
                    ));
                }
            } else {
                result.push(format!("{}\\{}\\Common7\\Tools\\", root, folder));
            }
        }
    }
    result
}

/// `devenv.com` next to a `Common7\Tools` folder.
fn devenv_from_tools_dir(tools_dir: &str) -> Option<PathBuf> {
    let converted = PathBuf::from(convert_from_windows_path(tools_dir));
    // Trailing separators don't survive normalization, so parent() is Common7.
    let normalized = normalize_path(&converted);
    let common7 = normalized.parent()?;
    Some(common7.join("ide").join("devenv.com"))
}

impl<E: Env> Locator<E> {
    pub fn where_is_p4(&mut self, opts: &LookupOptions) -> Option<PathBuf> {
        self.locate(&PERFORCE, opts)
    }

    pub fn where_is_git(&mut self, opts: &LookupOptions) -> Option<PathBuf> {
        self.locate(&GIT, opts)
    }

    pub fn where_is_doxygen(&mut self, opts: &LookupOptions) -> Option<PathBuf> {
        self.locate(&DOXYGEN, opts)
    }

    pub fn where_is_codeblocks(&mut self, opts: &LookupOptions) -> Option<PathBuf> {
        self.locate(&CODEBLOCKS, opts)
    }

    pub fn where_is_pdflatex(&mut self, opts: &LookupOptions) -> Option<PathBuf> {
        self.locate(&PDFLATEX, opts)
    }

    pub fn where_is_makeindex(&mut self, opts: &LookupOptions) -> Option<PathBuf> {
        self.locate(&MAKEINDEX, opts)
    }

    /// Look up any cacheable tool by id.
    pub fn where_is(&mut self, tool: Tool, opts: &LookupOptions) -> Option<PathBuf> {
        match tool {
            Tool::BurgerSdks => self.get_sdks_folder(opts),
            Tool::Perforce => self.where_is_p4(opts),
            Tool::Git => self.where_is_git(opts),
            Tool::Doxygen => self.where_is_doxygen(opts),
            Tool::Watcom => self.where_is_watcom(None, opts),
            Tool::CodeBlocks => self.where_is_codeblocks(opts),
            Tool::PdfLatex => self.where_is_pdflatex(opts),
            Tool::MakeIndex => self.where_is_makeindex(opts),
        }
    }

    /// Root of an Open Watcom install, or the full path of `command` in it.
    ///
    /// `wcc386` is used to verify an install. Watcom is never found on macOS.
    pub fn where_is_watcom(
        &mut self,
        command: Option<&str>,
        opts: &LookupOptions,
    ) -> Option<PathBuf> {
        let cached = self.prepare(Tool::Watcom, opts);
        let host = *self.host();
        let (exe_folder, suffix) = if host.windows {
            ("binnt", ".exe")
        } else if host.mac {
            return None;
        } else {
            ("binl", "")
        };
        let fake_command = format!("{}{}", command.unwrap_or("wcc386"), suffix);
        let resolve = |root: &Path| -> PathBuf {
            if command.is_some() {
                root.join(exe_folder).join(&fake_command)
            } else {
                root.to_path_buf()
            }
        };

        if let Some(root) = cached {
            return Some(resolve(&root));
        }

        let mut roots = Vec::new();
        if let Some(value) = self.env().var("WATCOM") {
            roots.push(PathBuf::from(convert_from_windows_path(&value)));
        }
        if host.windows {
            let home_drive = self.env().var("HOMEDRIVE").unwrap_or_else(|| "C:".to_string());
            roots.push(PathBuf::from(convert_from_windows_path(&format!(
                "{}\\WATCOM",
                home_drive
            ))));
            for var in WINDOWS_ENV_PATHS {
                if let Some(root) = self.env().var(var) {
                    roots.push(PathBuf::from(convert_from_windows_path(&format!(
                        "{}\\watcom",
                        root
                    ))));
                }
            }
        }
        if host.linux {
            roots.push(PathBuf::from("/usr/bin/watcom"));
        }

        for root in roots {
            if is_exe(&root.join(exe_folder).join(&fake_command)) {
                self.cache_mut().set(Tool::Watcom, root.clone());
                return Some(resolve(&root));
            }
        }
        if opts.verbose {
            println!("{} Watcom was not found!", "x".red());
        }
        None
    }

    /// `devenv.com` for a Visual Studio release year, Windows hosts only.
    pub fn where_is_visual_studio(&self, year: u32) -> Option<PathBuf> {
        if !self.host().windows {
            return None;
        }
        visual_studio_tool_dirs(self.env(), year)
            .iter()
            .filter_map(|dir| devenv_from_tools_dir(dir))
            .find(|path| path.is_file())
    }
}
