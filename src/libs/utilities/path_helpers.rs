// Path resolution helpers: tilde expansion for user-supplied overrides and
// executable discovery, both on PATH and inside freshly extracted toolchain
// trees whose layout we do not fully control.

use std::path::{Path, PathBuf};

use colored::Colorize;
use walkdir::WalkDir;

use crate::log_debug;

/// Expands a leading `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// Looks a program up on the current PATH, like `which`.
pub fn which(program: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(program);
        if is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Finds an executable with the given name anywhere under `root`, preferring
/// shallow matches. Extracted archives nest their `bin/` directories at
/// unpredictable depths, so a bounded walk beats hard-coding layouts.
pub fn find_executable(root: &Path, name: &str) -> Option<PathBuf> {
    if !root.exists() {
        return None;
    }
    let mut matches: Vec<PathBuf> = WalkDir::new(root)
        .max_depth(4)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name().to_str() == Some(name))
        .map(|entry| entry.into_path())
        .filter(|path| is_executable(path))
        .collect();

    matches.sort_by_key(|path| path.components().count());
    let found = matches.into_iter().next();
    if let Some(path) = &found {
        log_debug!("[Paths] Found {} at {}", name, path.display());
    }
    found
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.is_file()
        && path
            .metadata()
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[cfg(unix)]
    fn make_executable(path: &Path) {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).unwrap();
    }

    #[test]
    fn tilde_expansion_leaves_absolute_paths_alone() {
        assert_eq!(expand_tilde("/opt/tools"), PathBuf::from("/opt/tools"));
    }

    #[test]
    fn tilde_expansion_resolves_home() {
        let expanded = expand_tilde("~/somewhere");
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.ends_with("somewhere"));
    }

    #[cfg(unix)]
    #[test]
    fn finds_nested_executable_and_prefers_shallow_match() {
        let dir = tempfile::tempdir().unwrap();
        let shallow = dir.path().join("bin");
        let deep = dir.path().join("libexec/extra/bin");
        fs::create_dir_all(&shallow).unwrap();
        fs::create_dir_all(&deep).unwrap();
        for parent in [&shallow, &deep] {
            let exe = parent.join("mvn");
            fs::write(&exe, b"#!/bin/sh\n").unwrap();
            make_executable(&exe);
        }

        let found = find_executable(dir.path(), "mvn").unwrap();
        assert_eq!(found, shallow.join("mvn"));
    }

    #[test]
    fn missing_executable_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_executable(dir.path(), "mvn").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mvn"), b"data").unwrap();
        assert!(find_executable(dir.path(), "mvn").is_none());
    }
}
