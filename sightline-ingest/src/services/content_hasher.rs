//! Content hashing for asset deduplication
//!
//! Computes a fast 64-bit non-cryptographic digest (xxh3) of a file's full
//! content and derives the stable content identifier from it. The digest is
//! a dedup fingerprint, not an integrity check.

use sightline_common::ids;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use uuid::Uuid;
use xxhash_rust::xxh3::Xxh3;

/// Compute the 64-bit content digest of a file.
///
/// Reads in 1 MiB chunks. Returns `None` if the file cannot be read
/// (vanished mid-scan, permission denied); the caller treats that as
/// "exclude this file", never as a fatal condition.
pub fn digest(path: &Path) -> Option<u64> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to open file for hashing");
            return None;
        }
    };

    let mut hasher = Xxh3::new();
    let mut buffer = vec![0u8; 1024 * 1024];

    loop {
        let bytes_read = match file.read(&mut buffer) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read file for hashing");
                return None;
            }
        };

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Some(hasher.digest())
}

/// Derive the stable content identifier from a digest.
///
/// Deterministic: same digest always maps to the same identifier, across
/// processes and runs.
pub fn identifier_from_digest(digest: u64) -> Uuid {
    ids::content_id(digest)
}
