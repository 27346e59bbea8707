//! Data models for sightline-ingest

pub mod asset;
pub mod candidate;
pub mod submission;

pub use asset::Asset;
pub use candidate::{CandidateFile, ResolvedCandidate};
pub use submission::{Submission, CONTENT_DIR, DERIVED_DIR, KEEPALIVE_NAME, LINKS_DIR};
