//! Database access for sightline-ingest

pub mod assets;
pub mod submissions;
