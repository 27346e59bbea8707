//! Symlink farm maintenance
//!
//! The farm exposes one addressable link per live asset, named by the
//! asset's identifier, pointing back into the raw content subtree with a
//! relative target so the submission directory stays movable. The farm is a
//! derived artifact: the assets table is the source of truth and the farm is
//! rebuilt wholesale on every reconciliation pass.
//!
//! Ordering invariant: `snapshot_prior_targets` must be called and fully
//! captured before `rebuild` deletes anything, since identifier recycling
//! reads the old links.

use crate::models::{Asset, CONTENT_DIR, KEEPALIVE_NAME};
use sightline_common::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Result of one farm rebuild
#[derive(Debug, Default)]
pub struct RebuildOutcome {
    pub created: usize,
    /// Per-link failures; the rebuild continues for remaining assets
    pub errors: Vec<String>,
}

/// Recover previously assigned identifiers from the live links.
///
/// Returns a map from canonical raw-content path to the identifier parsed
/// out of the link's own filename. Keep-alive placeholders and reserved
/// subdirectories are skipped; dead targets and malformed names are
/// tolerated and skipped rather than raising.
pub fn snapshot_prior_targets(links_dir: &Path) -> Result<HashMap<PathBuf, Uuid>> {
    let mut targets = HashMap::new();

    for entry in std::fs::read_dir(links_dir)? {
        let entry = entry?;
        let name = entry.file_name();

        if name.to_str() == Some(KEEPALIVE_NAME) {
            continue;
        }

        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            // Reserved subtrees (derived media) hold no asset links
            continue;
        }
        if !file_type.is_symlink() {
            continue;
        }

        let identifier = match parse_link_identifier(&entry.path()) {
            Some(id) => id,
            None => {
                tracing::debug!(link = %entry.path().display(), "Skipping link with malformed identifier");
                continue;
            }
        };

        let raw_target = match std::fs::read_link(entry.path()) {
            Ok(target) => target,
            Err(e) => {
                tracing::debug!(link = %entry.path().display(), error = %e, "Skipping unreadable link");
                continue;
            }
        };

        // Relative targets resolve from the farm directory itself
        let absolute = if raw_target.is_absolute() {
            raw_target
        } else {
            links_dir.join(raw_target)
        };

        match absolute.canonicalize() {
            Ok(canonical) => {
                targets.insert(canonical, identifier);
            }
            Err(_) => {
                // Dead link: its target left the tree, nothing to recycle
                tracing::debug!(link = %entry.path().display(), "Skipping dead link");
            }
        }
    }

    Ok(targets)
}

/// Rebuild the farm to match `assets` exactly.
///
/// Every pre-existing link (keep-alive placeholder and reserved
/// subdirectories excepted) is deleted unconditionally, then one link per
/// asset is created. Individual link failures are recorded and do not abort
/// the rebuild.
pub fn rebuild(links_dir: &Path, assets: &[Asset]) -> Result<RebuildOutcome> {
    let mut outcome = RebuildOutcome::default();

    for entry in std::fs::read_dir(links_dir)? {
        let entry = entry?;

        if entry.file_name().to_str() == Some(KEEPALIVE_NAME) {
            continue;
        }
        if entry.file_type()?.is_dir() {
            continue;
        }

        if let Err(e) = std::fs::remove_file(entry.path()) {
            tracing::warn!(link = %entry.path().display(), error = %e, "Failed to remove stale link");
            outcome
                .errors
                .push(format!("{}: {}", entry.path().display(), e));
        }
    }

    for asset in assets {
        let link_path = links_dir.join(asset.link_file_name());
        let target = Path::new("..").join(CONTENT_DIR).join(&asset.path);

        match create_symlink(&target, &link_path) {
            Ok(()) => outcome.created += 1,
            Err(e) => {
                tracing::warn!(
                    asset = %asset.guid,
                    link = %link_path.display(),
                    error = %e,
                    "Failed to create asset link"
                );
                outcome.errors.push(format!("{}: {}", link_path.display(), e));
            }
        }
    }

    Ok(outcome)
}

/// Parse the asset identifier out of a link filename (`{guid}.{ext}` or a
/// bare guid)
fn parse_link_identifier(link: &Path) -> Option<Uuid> {
    let stem = link.file_stem()?.to_str()?;
    Uuid::parse_str(stem).ok()
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(all(unix, test))]
mod tests {
    use super::*;
    use crate::models::{Submission, DERIVED_DIR};
    use chrono::Utc;
    use sightline_common::ids;
    use std::fs;
    use tempfile::TempDir;

    /// Build a submission-shaped directory: content/ and links/derived/
    fn farm_fixture() -> (TempDir, PathBuf, PathBuf) {
        let root = TempDir::new().unwrap();
        let content = root.path().join(CONTENT_DIR);
        let links = root.path().join("links");
        fs::create_dir_all(&content).unwrap();
        fs::create_dir_all(links.join(DERIVED_DIR)).unwrap();
        fs::write(links.join(KEEPALIVE_NAME), b"").unwrap();
        (root, content, links)
    }

    fn asset_for(submission: &Submission, rel_path: &str, digest: u64) -> Asset {
        let content_guid = ids::content_id(digest);
        let semantic_guid = ids::semantic_id(submission.guid, content_guid);
        let now = Utc::now();
        Asset {
            guid: semantic_guid,
            semantic_guid,
            submission_guid: submission.guid,
            path: rel_path.to_string(),
            extension: "jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
            signature: "JPG image data".to_string(),
            size_bytes: 4,
            content_hash: format!("{digest:016x}"),
            content_guid,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn rebuild_creates_one_link_per_asset() {
        let (_root, content, links) = farm_fixture();
        fs::write(content.join("a.jpg"), b"aaaa").unwrap();
        fs::write(content.join("b.jpg"), b"bbbb").unwrap();

        let submission = Submission::new(None);
        let assets = vec![
            asset_for(&submission, "a.jpg", 1),
            asset_for(&submission, "b.jpg", 2),
        ];

        let outcome = rebuild(&links, &assets).unwrap();
        assert_eq!(outcome.created, 2);
        assert!(outcome.errors.is_empty());

        for asset in &assets {
            let link = links.join(asset.link_file_name());
            let resolved = link.canonicalize().unwrap();
            assert_eq!(resolved, content.join(&asset.path).canonicalize().unwrap());
        }
    }

    #[test]
    fn rebuild_removes_stale_links_but_keeps_placeholders() {
        let (_root, content, links) = farm_fixture();
        fs::write(content.join("old.jpg"), b"oooo").unwrap();

        let submission = Submission::new(None);
        let stale = asset_for(&submission, "old.jpg", 9);
        rebuild(&links, &[stale.clone()]).unwrap();
        assert!(links.join(stale.link_file_name()).exists());

        // Rebuild against an empty asset set clears the farm
        let outcome = rebuild(&links, &[]).unwrap();
        assert_eq!(outcome.created, 0);
        assert!(!links.join(stale.link_file_name()).exists());
        assert!(links.join(KEEPALIVE_NAME).exists());
        assert!(links.join(DERIVED_DIR).is_dir());
    }

    #[test]
    fn snapshot_maps_targets_to_identifiers() {
        let (_root, content, links) = farm_fixture();
        fs::write(content.join("a.jpg"), b"aaaa").unwrap();

        let submission = Submission::new(None);
        let asset = asset_for(&submission, "a.jpg", 1);
        rebuild(&links, &[asset.clone()]).unwrap();

        let targets = snapshot_prior_targets(&links).unwrap();
        let canonical = content.join("a.jpg").canonicalize().unwrap();
        assert_eq!(targets.get(&canonical), Some(&asset.guid));
    }

    #[test]
    fn snapshot_tolerates_dead_and_malformed_links() {
        let (_root, content, links) = farm_fixture();
        fs::write(content.join("live.jpg"), b"llll").unwrap();

        // Dead link: target never existed
        std::os::unix::fs::symlink(
            Path::new("..").join(CONTENT_DIR).join("gone.jpg"),
            links.join(format!("{}.jpg", ids::generate())),
        )
        .unwrap();

        // Malformed name: not parseable as an identifier
        std::os::unix::fs::symlink(
            Path::new("..").join(CONTENT_DIR).join("live.jpg"),
            links.join("not-a-guid.jpg"),
        )
        .unwrap();

        let targets = snapshot_prior_targets(&links).unwrap();
        assert!(targets.is_empty());
    }
}
