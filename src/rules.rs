//! Build rule commands dispatched by the buildme/cleanme family of tools.

use crate::config::{BuildRules, load_rules};
use crate::fileutils::{
    clean_directories, clean_files, delete_directory, delete_file, lock_files, unlock_files,
};
use crate::run::run_command;
use crate::setuputils::create_setup_py;
use anyhow::{Context, Result};
use colored::*;
use std::path::{Path, PathBuf};

/// Commands understood by [`rules`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleCommand {
    Build,
    Clean,
    Prebuild,
    Postbuild,
    Project,
    Configurations,
}

impl RuleCommand {
    pub fn parse(command: &str) -> Option<Self> {
        match command {
            "build" => Some(Self::Build),
            "clean" => Some(Self::Clean),
            "prebuild" => Some(Self::Prebuild),
            "postbuild" => Some(Self::Postbuild),
            "project" => Some(Self::Project),
            "configurations" => Some(Self::Configurations),
            _ => None,
        }
    }
}

/// Run a build rule command in `working_directory`.
///
/// `root` is false when a recursive tool reached this folder from a parent,
/// folders marked `no_recurse` are then skipped. Returns `0` on success,
/// `1` for an unknown command or unreadable rules, otherwise the failing
/// tool's exit code.
pub fn rules(command: &str, working_directory: &Path, root: bool) -> i32 {
    let Some(command) = RuleCommand::parse(command) else {
        eprintln!("{} Unknown build rule command \"{}\"", "x".red(), command);
        return 1;
    };
    match run_rule(command, working_directory, root) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "x".red(), e);
            1
        }
    }
}

fn run_rule(command: RuleCommand, dir: &Path, root: bool) -> Result<i32> {
    let rules = load_rules(dir)?;
    match command {
        RuleCommand::Build => {
            if !root && rules.buildme.no_recurse {
                return Ok(0);
            }
            build(&rules, dir)
        }
        RuleCommand::Clean => {
            if !root && rules.cleanme.no_recurse {
                return Ok(0);
            }
            clean(&rules, dir)?;
            Ok(0)
        }
        RuleCommand::Prebuild => Ok(run_step(&rules.prebuild, dir)),
        RuleCommand::Postbuild => Ok(run_step(&rules.postbuild, dir)),
        // Project files are generated by the caller from the configurations.
        RuleCommand::Project => Ok(0),
        RuleCommand::Configurations => {
            for config in &rules.configurations {
                println!("{}", config);
            }
            Ok(0)
        }
    }
}

/// Run an optional command line, `0` when there is none.
fn run_step(cmd: &[String], dir: &Path) -> i32 {
    if cmd.is_empty() {
        return 0;
    }
    run_command(cmd, Some(dir), false, false, false).code
}

fn build(rules: &BuildRules, dir: &Path) -> Result<i32> {
    let pyproject = dir.join("pyproject.toml");
    if pyproject.is_file() {
        create_setup_py(Some(&pyproject), Some(&dir.join("setup.py")))?;
    }

    let unlock_dirs: Vec<PathBuf> = if rules.buildme.unlock.is_empty() {
        vec![dir.to_path_buf()]
    } else {
        rules.buildme.unlock.iter().map(|d| dir.join(d)).collect()
    };
    let mut locked = Vec::new();
    for unlock in unlock_dirs.iter().filter(|d| d.is_dir()) {
        match unlock_files(unlock, false) {
            Ok(files) => locked.extend(files),
            Err(e) => {
                // Put back what was already unlocked before giving up
                lock_files(&locked).context("Failed to relock files")?;
                return Err(e).with_context(|| format!("Failed to unlock {}", unlock.display()));
            }
        }
    }

    let code = run_step(&rules.buildme.command, dir);
    lock_files(&locked).context("Failed to relock files")?;
    Ok(code)
}

fn clean(rules: &BuildRules, dir: &Path) -> Result<()> {
    for item in &rules.clean.directories {
        delete_directory(&dir.join(item), true)
            .with_context(|| format!("Failed to delete {}", item))?;
    }
    if rules.clean.setup_py {
        delete_file(&dir.join("setup.py"))?;
    }
    let recursive: Vec<&str> = rules
        .clean
        .recursive_directories
        .iter()
        .map(String::as_str)
        .collect();
    if !recursive.is_empty() {
        clean_directories(dir, &recursive, true)?;
    }
    let files: Vec<&str> = rules.clean.files.iter().map(String::as_str).collect();
    if !files.is_empty() {
        clean_files(dir, &files, true, true)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RULES_FILE;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_unknown_command() {
        let dir = TempDir::new().unwrap();
        assert_eq!(rules("explode", dir.path(), true), 1);
        assert_eq!(RuleCommand::parse("clean"), Some(RuleCommand::Clean));
    }

    #[test]
    fn test_defaults_do_nothing() {
        let dir = TempDir::new().unwrap();
        for cmd in ["build", "clean", "prebuild", "postbuild", "project", "configurations"] {
            assert_eq!(rules(cmd, dir.path(), true), 0, "{}", cmd);
        }
    }

    #[test]
    fn test_bad_rules_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(RULES_FILE), "[clean").unwrap();
        assert_eq!(rules("clean", dir.path(), true), 1);
    }

    #[test]
    fn test_clean_rules() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(
            root.join(RULES_FILE),
            "[clean]\ndirectories = [\"dist\"]\nrecursive_directories = [\"__pycache__\"]\n\
             files = [\"*.pyc\"]\nsetup_py = true\n",
        )
        .unwrap();
        fs::create_dir_all(root.join("dist")).unwrap();
        fs::create_dir_all(root.join("pkg").join("__pycache__")).unwrap();
        fs::write(root.join("pkg").join("a.pyc"), "").unwrap();
        fs::write(root.join("setup.py"), "").unwrap();
        fs::write(root.join("keep.py"), "").unwrap();

        assert_eq!(rules("clean", root, true), 0);
        assert!(!root.join("dist").exists());
        assert!(!root.join("pkg").join("__pycache__").exists());
        assert!(!root.join("pkg").join("a.pyc").exists());
        assert!(!root.join("setup.py").exists());
        assert!(root.join("keep.py").exists());
    }

    #[test]
    fn test_no_recurse_skips_child_folders() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(RULES_FILE),
            "[cleanme]\nno_recurse = true\n[clean]\ndirectories = [\"dist\"]\n",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("dist")).unwrap();
        assert_eq!(rules("clean", dir.path(), false), 0);
        assert!(dir.path().join("dist").exists());
        assert_eq!(rules("clean", dir.path(), true), 0);
        assert!(!dir.path().join("dist").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_build_generates_setup_py_and_relocks() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("pyproject.toml"), "[project]\nname = \"demo\"\n").unwrap();
        fs::write(
            root.join(RULES_FILE),
            "[buildme]\ncommand = [\"sh\", \"-c\", \"exit 4\"]\n",
        )
        .unwrap();
        let locked = root.join("locked.txt");
        fs::write(&locked, "").unwrap();
        lock_files(std::slice::from_ref(&locked)).unwrap();

        assert_eq!(rules("build", root, true), 4);
        assert!(root.join("setup.py").is_file());
        assert!(crate::fileutils::is_write_protected(&locked).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_unlock_relocks_earlier_folders() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(
            root.join(RULES_FILE),
            "[buildme]\nunlock = [\"a\", \"b\"]\ncommand = [\"sh\", \"-c\", \"exit 0\"]\n",
        )
        .unwrap();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::create_dir_all(root.join("b")).unwrap();
        let locked = root.join("a").join("locked.txt");
        fs::write(&locked, "").unwrap();
        lock_files(std::slice::from_ref(&locked)).unwrap();
        std::os::unix::fs::symlink(root.join("missing"), root.join("b").join("dangling")).unwrap();

        assert_eq!(rules("build", root, true), 1);
        assert!(crate::fileutils::is_write_protected(&locked).unwrap());
    }
}
