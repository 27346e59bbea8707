//! File classification against the configured MIME whitelist
//!
//! Cheap structural exclusions (hidden entries, directories, symlinks) come
//! first, then magic-byte sniffing. The whitelist check runs before any
//! hashing, since it is the dominant filter.

use crate::models::KEEPALIVE_NAME;
use sightline_common::Result;
use std::collections::HashSet;
use std::path::Path;

/// Classification outcome for one candidate file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// File is managed content; proceed to hashing
    Accepted { mime_type: String, signature: String },
    /// File is excluded from management (counted as skipped, not an error)
    Excluded(ExcludeReason),
}

/// Reason a file was excluded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExcludeReason {
    /// Name begins with the hidden marker (keep-alive placeholder exempt)
    Hidden,
    Directory,
    Symlink,
    /// Content sniffing found no known format
    UnknownType,
    /// Detected MIME type is not in the configured whitelist
    UnsupportedType(String),
}

/// Classifies files by sniffed content type
#[derive(Debug, Clone)]
pub struct FileClassifier {
    accepted: HashSet<String>,
}

impl FileClassifier {
    /// Create a classifier for the given MIME whitelist
    pub fn new(accepted_mime_types: &[String]) -> Self {
        Self {
            accepted: accepted_mime_types.iter().cloned().collect(),
        }
    }

    /// Classify a single on-disk entry.
    ///
    /// Per-file I/O failures surface as errors for the caller to record; the
    /// structural exclusions never touch file content.
    pub fn classify(&self, path: &Path) -> Result<Classification> {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.starts_with('.') && name != KEEPALIVE_NAME {
                return Ok(Classification::Excluded(ExcludeReason::Hidden));
            }
        }

        // symlink_metadata does not follow the link, so link-to-file is
        // still reported as a symlink here.
        let metadata = std::fs::symlink_metadata(path)?;
        if metadata.file_type().is_symlink() {
            return Ok(Classification::Excluded(ExcludeReason::Symlink));
        }
        if metadata.is_dir() {
            return Ok(Classification::Excluded(ExcludeReason::Directory));
        }

        let detected = infer::get_from_path(path)?;
        let kind = match detected {
            Some(kind) => kind,
            None => return Ok(Classification::Excluded(ExcludeReason::UnknownType)),
        };

        let mime_type = kind.mime_type().to_string();
        if !self.accepted.contains(&mime_type) {
            return Ok(Classification::Excluded(ExcludeReason::UnsupportedType(
                mime_type,
            )));
        }

        Ok(Classification::Accepted {
            signature: signature_for(&kind),
            mime_type,
        })
    }
}

/// Human-readable format signature, e.g. "JPG image data"
fn signature_for(kind: &infer::Type) -> String {
    use infer::MatcherType;

    let family = match kind.matcher_type() {
        MatcherType::Image => "image",
        MatcherType::Video => "video",
        MatcherType::Audio => "audio",
        MatcherType::Archive => "archive",
        MatcherType::Doc => "document",
        MatcherType::Font => "font",
        MatcherType::Text => "text",
        MatcherType::Book => "book",
        MatcherType::App => "application",
        _ => "binary",
    };

    format!("{} {} data", kind.extension().to_uppercase(), family)
}
