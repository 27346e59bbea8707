//! Transient per-file records for one reconciliation pass
//!
//! These carry the walk → classify → hash → resolve pipeline's intermediate
//! values explicitly; nothing here is persisted.

use crate::models::Asset;
use chrono::Utc;
use std::path::PathBuf;
use uuid::Uuid;

/// A file that survived walking and classification
#[derive(Debug, Clone)]
pub struct CandidateFile {
    /// Canonical absolute path on disk
    pub abs_path: PathBuf,
    /// Path relative to the submission's raw content subtree
    pub rel_path: String,
    /// Lowercased extension without the leading dot, empty if none
    pub extension: String,
    pub mime_type: String,
    pub signature: String,
    pub size_bytes: i64,
}

/// A candidate with its content digest and resolved identity
#[derive(Debug, Clone)]
pub struct ResolvedCandidate {
    pub file: CandidateFile,
    pub content_hash: u64,
    pub content_guid: Uuid,
    /// Dedup/matching key: derived from (submission, content)
    pub semantic_guid: Uuid,
    /// Chosen primary identifier: recycled from a prior symlink when
    /// available, the semantic identifier otherwise
    pub asset_guid: Uuid,
}

impl ResolvedCandidate {
    /// Materialize the asset row this candidate stands for
    pub fn into_asset(self, submission_guid: Uuid) -> Asset {
        let now = Utc::now();
        Asset {
            guid: self.asset_guid,
            semantic_guid: self.semantic_guid,
            submission_guid,
            path: self.file.rel_path,
            extension: self.file.extension,
            mime_type: self.file.mime_type,
            signature: self.file.signature,
            size_bytes: self.file.size_bytes,
            content_hash: format!("{:016x}", self.content_hash),
            content_guid: self.content_guid,
            created_at: now,
            updated_at: now,
        }
    }
}
