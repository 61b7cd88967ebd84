// Retry-aware directory removal.
//
// Editors, indexers and antivirus scanners hold transient locks on files in
// freshly cloned trees; a single failed `remove_dir_all` is not authoritative.
// Removal is retried a bounded number of times with a fixed backoff, clearing
// read-only attributes between attempts. Anything other than a lock-class
// error aborts immediately.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use colored::Colorize;
use walkdir::WalkDir;

use crate::constants::{MAX_RMTREE_RETRIES, RETRY_DELAY};
use crate::{log_debug, log_error, log_success, log_warn};

/// Removes a directory tree, retrying on lock-class errors.
///
/// Returns `true` once the path no longer exists. A missing path is an
/// immediate success. Returns `false` when the final attempt still failed;
/// the tree is left partially or fully intact and the caller must treat the
/// cleanup as requiring manual intervention.
pub fn remove_tree(path: &Path, max_retries: usize) -> bool {
    remove_tree_with(path, max_retries, attempt_removal, |delay| {
        std::thread::sleep(delay)
    })
}

/// Same as [`remove_tree`] with the default retry budget.
pub fn remove_tree_default(path: &Path) -> bool {
    remove_tree(path, MAX_RMTREE_RETRIES)
}

/// Retry core with injectable attempt and sleep functions, so tests can count
/// attempts and run without wall-clock delay.
fn remove_tree_with<A, S>(path: &Path, max_retries: usize, mut attempt: A, mut sleep: S) -> bool
where
    A: FnMut(&Path) -> io::Result<()>,
    S: FnMut(Duration),
{
    if !path.exists() {
        log_debug!(
            "[FileOps] Nothing to remove, path does not exist: {}",
            path.display()
        );
        return true;
    }

    for attempt_number in 1..=max_retries {
        match attempt(path) {
            Ok(()) => {
                log_success!("Removed directory: {}", path.display().to_string().green());
                return true;
            }
            Err(err) if is_lock_error(&err) => {
                if attempt_number < max_retries {
                    log_warn!(
                        "[FileOps] Attempt {}/{}: directory is locked, retrying...",
                        attempt_number,
                        max_retries
                    );
                    sleep(RETRY_DELAY);
                } else {
                    log_error!(
                        "[FileOps] Failed to remove {} after {} attempts",
                        path.display().to_string().red(),
                        max_retries
                    );
                    log_warn!(
                        "[FileOps] Close any programs using files under that directory, \
                         then delete it manually"
                    );
                    return false;
                }
            }
            Err(err) => {
                // Disk or filesystem trouble; retrying will not help.
                log_error!(
                    "[FileOps] Error removing {}: {}",
                    path.display().to_string().red(),
                    err
                );
                return false;
            }
        }
    }
    false
}

/// One removal attempt. On a lock-class failure, read-only attributes in the
/// tree are cleared so the next attempt can delete files a checkout marked
/// read-only (git object files, for instance).
fn attempt_removal(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(err) if is_lock_error(&err) => {
            clear_readonly_attributes(path);
            Err(err)
        }
        Err(err) => Err(err),
    }
}

fn is_lock_error(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::PermissionDenied
}

/// Best-effort pass making every entry under `path` writable.
fn clear_readonly_attributes(path: &Path) {
    for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
        if let Ok(metadata) = entry.metadata() {
            let mut permissions = metadata.permissions();
            if permissions.readonly() {
                #[allow(clippy::permissions_set_readonly_false)]
                permissions.set_readonly(false);
                let _ = fs::set_permissions(entry.path(), permissions);
            }
        }
    }
}
