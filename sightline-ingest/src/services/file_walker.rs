//! Recursive enumeration of a submission's raw content subtree

use crate::models::KEEPALIVE_NAME;
use sightline_common::{Error, Result};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Result of one traversal
#[derive(Debug, Default)]
pub struct WalkOutcome {
    /// Canonical absolute paths of every regular file found
    pub files: Vec<PathBuf>,
    /// Per-entry failures (permission, vanished file); the walk continues
    pub errors: Vec<String>,
}

/// Recursively enumerate regular files under `root`.
///
/// Hidden entries (keep-alive placeholder exempt) are pruned here as well as
/// in the classifier; both layers enforce the rule independently. Symlinks
/// are never followed. Every yielded path is canonicalized and verified
/// absolute and existing; a violation of that check is an internal
/// consistency error, not a per-file one.
pub fn walk(root: &Path) -> Result<WalkOutcome> {
    if !root.is_dir() {
        return Err(Error::Internal(format!(
            "Walk root is not a directory: {}",
            root.display()
        )));
    }

    let mut outcome = WalkOutcome::default();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(should_descend);

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "Error accessing entry during walk");
                outcome.errors.push(e.to_string());
                continue;
            }
        };

        // file_type() comes from symlink_metadata, so symlinks are not
        // regular files here even when their target is.
        if !entry.file_type().is_file() {
            continue;
        }

        let canonical = match entry.path().canonicalize() {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "Failed to canonicalize path");
                outcome
                    .errors
                    .push(format!("{}: {}", entry.path().display(), e));
                continue;
            }
        };

        if !canonical.is_absolute() || !canonical.exists() {
            return Err(Error::Internal(format!(
                "Walked path failed sanity check: {}",
                canonical.display()
            )));
        }

        outcome.files.push(canonical);
    }

    Ok(outcome)
}

/// Prune hidden subtrees (keep-alive placeholder exempt) without pruning the
/// walk root itself.
fn should_descend(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return true;
    }

    match entry.file_name().to_str() {
        Some(name) => !name.starts_with('.') || name == KEEPALIVE_NAME,
        None => true,
    }
}
