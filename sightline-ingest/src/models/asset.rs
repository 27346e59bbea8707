//! Asset model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One managed, deduplicated unit of content within a submission.
///
/// `semantic_guid` is derived from the (submission, content) pair and is the
/// dedup key; `guid` is the externally visible identifier and may be recycled
/// across re-ingestions of the same path. Everything except the three
/// identity fields is overwritten in place when the same semantic identity is
/// observed again with changed metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub guid: Uuid,
    pub semantic_guid: Uuid,
    pub submission_guid: Uuid,

    /// Path relative to the submission's raw content subtree
    pub path: String,
    /// Lowercased extension without the leading dot, empty if none
    pub extension: String,
    pub mime_type: String,
    /// Human-readable format signature, e.g. "JPG image data"
    pub signature: String,
    pub size_bytes: i64,
    /// Hex-encoded 64-bit content digest
    pub content_hash: String,
    /// Identifier derived from the content digest alone
    pub content_guid: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Asset {
    /// True when every mutable field matches `other`.
    ///
    /// Used by the reconciliation engine to turn a no-change update into a
    /// no-op so an unchanged tree produces zero database writes.
    pub fn same_content_as(&self, other: &Asset) -> bool {
        self.path == other.path
            && self.extension == other.extension
            && self.mime_type == other.mime_type
            && self.signature == other.signature
            && self.size_bytes == other.size_bytes
            && self.content_hash == other.content_hash
            && self.content_guid == other.content_guid
    }

    /// Symlink farm entry name for this asset: `{guid}.{ext}`, or the bare
    /// guid when the original file had no extension.
    pub fn link_file_name(&self) -> String {
        if self.extension.is_empty() {
            self.guid.to_string()
        } else {
            format!("{}.{}", self.guid, self.extension)
        }
    }
}
