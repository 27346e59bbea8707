//! Identity resolution for candidate files
//!
//! The semantic identifier is derived from the (submission, content) pair
//! and is the dedup key for matching database rows. The asset's primary
//! identifier is normally the semantic identifier too, except when a live
//! symlink from a previous pass already assigned one to the same on-disk
//! path. That identifier is recycled, keeping externally visible asset
//! identifiers stable across re-ingestion.

use sightline_common::ids;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Outcome of identity resolution for one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedIdentity {
    /// Canonical dedup key, always derived from (submission, content)
    pub semantic_guid: Uuid,
    /// Chosen primary identifier (recycled or freshly derived)
    pub asset_guid: Uuid,
    /// True when the identifier was recovered from a prior symlink
    pub recycled: bool,
}

/// Resolve the identity of one candidate file.
///
/// `prior_targets` maps canonical raw-content paths to the identifier a
/// live symlink previously assigned to them; an entry there takes precedence
/// over minting a new identifier.
pub fn resolve(
    submission_guid: Uuid,
    content_guid: Uuid,
    abs_path: &Path,
    prior_targets: &HashMap<PathBuf, Uuid>,
) -> ResolvedIdentity {
    let semantic_guid = ids::semantic_id(submission_guid, content_guid);

    match prior_targets.get(abs_path) {
        Some(prior) => ResolvedIdentity {
            semantic_guid,
            asset_guid: *prior,
            recycled: true,
        },
        None => ResolvedIdentity {
            semantic_guid,
            asset_guid: semantic_guid,
            recycled: false,
        },
    }
}
