//! Submission model and working-directory layout

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Raw uploaded content subtree, owned by the version-control layer
pub const CONTENT_DIR: &str = "content";
/// Managed symlink farm subtree, owned by the reconciliation engine
pub const LINKS_DIR: &str = "links";
/// Reserved subtree under the farm for derived media (thumbnails etc.)
pub const DERIVED_DIR: &str = "derived";
/// Keep-alive placeholder so empty directories survive version-control
/// operations
pub const KEEPALIVE_NAME: &str = ".touch";

/// A version-control-backed container of uploaded raw content and its
/// managed assets.
///
/// Each submission owns a working directory under the storage root:
///
/// ```text
/// <storage_root>/<guid>/
///     content/          raw uploaded files
///     links/            one symlink per managed asset
///     links/derived/    reserved
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub guid: Uuid,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    /// Create a new submission record with a fresh identifier
    pub fn new(description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            guid: sightline_common::ids::generate(),
            description,
            created_at: now,
            updated_at: now,
        }
    }

    /// Working directory for this submission
    pub fn root_dir(&self, storage_root: &Path) -> PathBuf {
        storage_root.join(self.guid.to_string())
    }

    /// Raw content subtree
    pub fn content_dir(&self, storage_root: &Path) -> PathBuf {
        self.root_dir(storage_root).join(CONTENT_DIR)
    }

    /// Managed symlink farm subtree
    pub fn links_dir(&self, storage_root: &Path) -> PathBuf {
        self.root_dir(storage_root).join(LINKS_DIR)
    }
}
