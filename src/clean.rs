//! Removal of IDE and Python build droppings.

use crate::fileutils::{clean_directories, clean_files, delete_file};
use std::fs;
use std::io;
use std::path::Path;

fn subdirectories(path: &Path) -> io::Result<Vec<std::path::PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Remove per-user state from every `*.xcodeproj` bundle in `path`.
pub fn clean_xcode(path: &Path, recursive: bool) -> io::Result<()> {
    for dir in subdirectories(path)? {
        let is_project = dir.extension().is_some_and(|e| e == "xcodeproj")
            && dir.join("project.pbxproj").is_file();
        if is_project {
            clean_directories(&dir, &["xcuserdata", "project.xcworkspace"], false)?;
            clean_files(&dir, &["*.mode1v3", "*.pbxuser"], false, false)?;
        } else if recursive {
            clean_xcode(&dir, recursive)?;
        }
    }
    Ok(())
}

/// Delete the `.depend` and `.layout` files next to every `*.cbp` project.
pub fn clean_codeblocks(path: &Path, recursive: bool) -> io::Result<()> {
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let file = entry.path();
        let is_project = file
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("cbp"));
        if is_project && file.is_file() {
            delete_file(&file.with_extension("depend"))?;
            delete_file(&file.with_extension("layout"))?;
        } else if recursive && file.is_dir() {
            clean_codeblocks(&file, recursive)?;
        }
    }
    Ok(())
}

/// Remove build output from a folder holding `setup.py`.
pub fn clean_setup_py(path: &Path, recursive: bool) -> io::Result<()> {
    if path.join("setup.py").is_file() {
        clean_directories(
            path,
            &["dist", "build", "_build", ".tox", ".pytestcache", "*.egg-info"],
            false,
        )?;
        clean_directories(path, &["__pycache__"], true)?;
        clean_files(path, &["*.pyc", "*.pyo"], true, false)?;
    }
    if recursive {
        for dir in subdirectories(path)? {
            clean_setup_py(&dir, recursive)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clean_xcode() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("nested").join("game.xcodeproj");
        fs::create_dir_all(project.join("xcuserdata").join("me.xcuserdatad")).unwrap();
        fs::create_dir_all(project.join("project.xcworkspace")).unwrap();
        fs::write(project.join("project.pbxproj"), "").unwrap();
        fs::write(project.join("me.pbxuser"), "").unwrap();
        fs::write(project.join("me.mode1v3"), "").unwrap();

        clean_xcode(dir.path(), false).unwrap();
        assert!(project.join("xcuserdata").exists());

        clean_xcode(dir.path(), true).unwrap();
        assert!(!project.join("xcuserdata").exists());
        assert!(!project.join("project.xcworkspace").exists());
        assert!(!project.join("me.pbxuser").exists());
        assert!(!project.join("me.mode1v3").exists());
        assert!(project.join("project.pbxproj").exists());
    }

    #[test]
    fn test_clean_xcode_requires_pbxproj() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("fake.xcodeproj");
        fs::create_dir_all(project.join("xcuserdata")).unwrap();
        clean_xcode(dir.path(), false).unwrap();
        assert!(project.join("xcuserdata").exists());
    }

    #[test]
    fn test_clean_codeblocks() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir_all(&sub).unwrap();
        for name in ["app.cbp", "app.depend", "app.layout", "other.layout"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::write(sub.join("lib.CBP"), "").unwrap();
        fs::write(sub.join("lib.depend"), "").unwrap();

        clean_codeblocks(dir.path(), false).unwrap();
        assert!(!dir.path().join("app.depend").exists());
        assert!(!dir.path().join("app.layout").exists());
        assert!(dir.path().join("other.layout").exists());
        assert!(sub.join("lib.depend").exists());

        clean_codeblocks(dir.path(), true).unwrap();
        assert!(!sub.join("lib.depend").exists());
    }

    #[test]
    fn test_clean_setup_py() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        for d in ["dist", "build", ".tox", "burger.egg-info", "src/__pycache__"] {
            fs::create_dir_all(root.join(d)).unwrap();
        }
        fs::write(root.join("src").join("mod.pyc"), "").unwrap();
        fs::write(root.join("src").join("mod.py"), "").unwrap();

        clean_setup_py(root, false).unwrap();
        assert!(root.join("dist").exists());

        fs::write(root.join("setup.py"), "").unwrap();
        clean_setup_py(root, false).unwrap();
        for d in ["dist", "build", ".tox", "burger.egg-info", "src/__pycache__"] {
            assert!(!root.join(d).exists(), "{} survived", d);
        }
        assert!(!root.join("src").join("mod.pyc").exists());
        assert!(root.join("src").join("mod.py").exists());
    }
}
