//! Per-directory build rules read from `build_rules.toml`.
//!
//! ```toml
//! configurations = ["Debug", "Release"]
//! prebuild = ["python", "gen.py"]
//!
//! [buildme]
//! no_recurse = false
//! command = ["python", "-m", "build"]
//! unlock = [".", "burger"]
//!
//! [clean]
//! directories = ["dist", "build", "temp"]
//! recursive_directories = ["__pycache__"]
//! files = ["*.pyc", "*.pyo"]
//! setup_py = true
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const RULES_FILE: &str = "build_rules.toml";

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct BuildRules {
    pub buildme: BuildmeRules,
    pub cleanme: CleanmeRules,
    pub clean: CleanRules,
    /// Configurations the project can build
    pub configurations: Vec<String>,
    /// Command run before building
    pub prebuild: Vec<String>,
    /// Command run after building
    pub postbuild: Vec<String>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct BuildmeRules {
    /// Skip this folder when building recursively
    pub no_recurse: bool,
    /// Built before this folder
    pub dependencies: Vec<String>,
    /// Build command, run in the rules folder
    pub command: Vec<String>,
    /// Folders whose read-only files are unlocked during the build
    pub unlock: Vec<String>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct CleanmeRules {
    pub no_recurse: bool,
    pub dependencies: Vec<String>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct CleanRules {
    /// Deleted with any read-only content
    pub directories: Vec<String>,
    /// Wildcards of directories deleted anywhere below the folder
    pub recursive_directories: Vec<String>,
    /// Wildcards of files deleted anywhere below the folder
    pub files: Vec<String>,
    /// Also delete a generated `setup.py`
    pub setup_py: bool,
}

/// Load the rules for `dir`. A folder without a rules file gets the defaults.
pub fn load_rules(dir: &Path) -> Result<BuildRules> {
    let path = dir.join(RULES_FILE);
    if !path.exists() {
        return Ok(BuildRules::default());
    }
    let text = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&text).with_context(|| {
        format!(
            "Failed to parse {} - check for syntax errors (missing quotes, brackets)",
            path.display()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(load_rules(dir.path()).unwrap(), BuildRules::default());
    }

    #[test]
    fn test_partial_rules() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(RULES_FILE),
            "configurations = [\"Debug\"]\n[clean]\nfiles = [\"*.pyc\"]\nsetup_py = true\n",
        )
        .unwrap();
        let rules = load_rules(dir.path()).unwrap();
        assert_eq!(rules.configurations, vec!["Debug"]);
        assert_eq!(rules.clean.files, vec!["*.pyc"]);
        assert!(rules.clean.setup_py);
        assert!(rules.buildme.command.is_empty());
        assert!(!rules.cleanme.no_recurse);
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(RULES_FILE), "configurations = [").unwrap();
        let err = load_rules(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }
}
