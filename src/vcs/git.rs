//! git queries and the git version header.

use super::{TOOL_NOT_FOUND, write_header};
use crate::locators::{Env, Locator, LookupOptions};
use crate::run::run_command;
use std::path::Path;

/// True if `working_directory` is inside a git work tree.
pub fn is_under_git_control<E: Env>(locator: &mut Locator<E>, working_directory: &Path) -> bool {
    let Some(git) = locator.where_is_git(&LookupOptions::default()) else {
        return false;
    };
    let git = git.to_string_lossy().into_owned();
    run_command(&[git.as_str(), "rev-parse"], Some(working_directory), true, true, true).success()
}

/// Run git and return its trimmed output, or the exit code on failure.
///
/// git's own error output is only shown when `verbose`.
fn call_git(git: &str, args: &[&str], working_dir: &Path, verbose: bool) -> Result<String, i32> {
    let mut cmd = vec![git];
    cmd.extend_from_slice(args);
    if verbose {
        println!("{}", cmd.join(" "));
    }
    let result = run_command(&cmd, Some(working_dir), true, true, !verbose);
    if result.success() {
        Ok(result.stdout.trim().to_string())
    } else {
        Err(result.code)
    }
}

/// Values written to the git version header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitVersion {
    pub hash: String,
    pub branch: Option<String>,
    pub full_tag: Option<String>,
    pub tag: Option<String>,
}

impl GitVersion {
    /// `#define` lines, skipping anything empty or unknown.
    pub fn defines(&self) -> Vec<String> {
        [
            ("GIT_HASH", Some(&self.hash)),
            ("GIT_BRANCH", self.branch.as_ref()),
            ("GIT_FULL_TAG", self.full_tag.as_ref()),
            ("GIT_TAG", self.tag.as_ref()),
        ]
        .into_iter()
        .filter_map(|(name, value)| {
            value
                .filter(|v| !v.is_empty())
                .map(|v| format!("#define {} \"{}\"", name, v))
        })
        .collect()
    }
}

/// Write a C header with the current commit, branch and tags.
///
/// Returns `0` on success, `10` if git is missing, git's exit code if the
/// directory isn't a repository or `2` if the header couldn't be written.
pub fn make_git_version_header<E: Env>(
    locator: &mut Locator<E>,
    working_dir: &Path,
    output_file: &Path,
    verbose: bool,
) -> i32 {
    let Some(git) = locator.where_is_git(&LookupOptions::default()) else {
        return TOOL_NOT_FOUND;
    };
    let git = git.to_string_lossy().into_owned();

    let hash = match call_git(&git, &["rev-parse", "HEAD"], working_dir, verbose) {
        Ok(hash) => hash,
        Err(code) => return code,
    };
    // A repository without tags or on a detached head is still valid.
    let version = GitVersion {
        hash,
        branch: call_git(&git, &["rev-parse", "--abbrev-ref", "HEAD"], working_dir, verbose).ok(),
        tag: call_git(&git, &["describe", "--tags", "--abbrev=0"], working_dir, verbose).ok(),
        full_tag: call_git(&git, &["describe", "--tags", "--long"], working_dir, verbose).ok(),
    };

    write_header(
        output_file,
        "burger::vcs::git::make_git_version_header",
        &version.defines(),
        verbose,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locators::{HostFlags, MemoryEnv, Tool};
    use tempfile::TempDir;

    #[test]
    fn test_defines_skip_missing_values() {
        let version = GitVersion {
            hash: "abc123".into(),
            branch: Some("main".into()),
            full_tag: None,
            tag: Some(String::new()),
        };
        assert_eq!(
            version.defines(),
            vec!["#define GIT_HASH \"abc123\"", "#define GIT_BRANCH \"main\""]
        );
    }

    #[test]
    fn test_missing_git() {
        let env = MemoryEnv::new().with("PATH", "/burger-nonexistent");
        let mut locator = Locator::with_env(env, HostFlags::mac());
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("git.h");
        assert_eq!(
            make_git_version_header(&mut locator, dir.path(), &out, false),
            TOOL_NOT_FOUND
        );
        assert!(!is_under_git_control(&mut locator, dir.path()));
    }

    #[cfg(unix)]
    #[test]
    fn test_header_from_fake_git() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let git = dir.path().join("git");
        std::fs::write(
            &git,
            "#!/bin/sh\n\
             if [ \"$1\" = rev-parse ] && [ \"$2\" = HEAD ]; then echo deadbeef; exit 0; fi\n\
             if [ \"$1\" = rev-parse ]; then echo main; exit 0; fi\n\
             exit 128\n",
        )
        .unwrap();
        std::fs::set_permissions(&git, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut locator = Locator::with_env(MemoryEnv::new(), HostFlags::linux());
        locator.cache_mut().set(Tool::Git, &git);
        let out = dir.path().join("gitversion.h");
        assert_eq!(make_git_version_header(&mut locator, dir.path(), &out, false), 0);
        let text = std::fs::read_to_string(&out).unwrap();
        assert!(text.contains("#define GIT_HASH \"deadbeef\"\n"));
        assert!(text.contains("#define GIT_BRANCH \"main\"\n"));
        assert!(!text.contains("GIT_TAG"));
        assert!(is_under_git_control(&mut locator, dir.path()));
    }
}
