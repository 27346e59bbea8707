//! Stable identifier derivation
//!
//! All identifiers in Sightline live in a single UUID namespace. Submissions
//! mint random v4 identifiers; content and semantic identifiers are derived
//! deterministically (v5) so that the same bytes always map to the same
//! identifier, across processes and runs.

use uuid::Uuid;

/// Fixed namespace under which content identifiers are derived.
pub const CONTENT_NAMESPACE: Uuid = Uuid::from_u128(0x6b1f_e7a9_4c3d_4e29_b0d8_5f2a_71c9_e604);

/// Generate a new random identifier (submissions)
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse an identifier from its string form
pub fn parse(s: &str) -> std::result::Result<Uuid, uuid::Error> {
    Uuid::parse_str(s)
}

/// Derive the content identifier for a 64-bit content digest.
///
/// Same digest always yields the same identifier; there is no randomness or
/// time component involved.
pub fn content_id(digest: u64) -> Uuid {
    Uuid::new_v5(&CONTENT_NAMESPACE, format!("{digest:016x}").as_bytes())
}

/// Derive the semantic identifier for a (submission, content) pair.
///
/// The submission identifier acts as the namespace, so identical content in
/// two different submissions yields two distinct semantic identifiers.
pub fn semantic_id(submission: Uuid, content: Uuid) -> Uuid {
    Uuid::new_v5(&submission, content.as_bytes())
}
