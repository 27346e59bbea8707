//! Shared fixtures for ingest integration tests

use sightline_common::config::{default_accepted_mime_types, IngestConfig};
use sightline_common::db::init_database;
use sightline_ingest::{Reconciler, SubmissionStore};
use sqlx::SqlitePool;
use std::path::Path;
use tempfile::TempDir;

pub struct TestHarness {
    /// Keeps the storage root alive for the duration of the test
    pub storage: TempDir,
    pub pool: SqlitePool,
    pub store: SubmissionStore,
    pub reconciler: Reconciler,
}

pub async fn harness() -> TestHarness {
    let storage = TempDir::new().unwrap();
    let database_path = storage.path().join("sightline.db");
    let pool = init_database(&database_path).await.unwrap();

    let config = IngestConfig {
        storage_root: storage.path().to_path_buf(),
        database_path,
        accepted_mime_types: default_accepted_mime_types(),
        log_filter: "info".to_string(),
    };

    let store = SubmissionStore::new(pool.clone(), &config);
    let reconciler = Reconciler::new(pool.clone(), &config);

    TestHarness {
        storage,
        pool,
        store,
        reconciler,
    }
}

/// Minimal JPEG: valid magic bytes followed by seed bytes to vary content
pub fn jpeg_bytes(seed: u8) -> Vec<u8> {
    let mut bytes = vec![
        0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00,
    ];
    bytes.extend_from_slice(&[seed; 16]);
    bytes
}

/// Minimal PE executable header; not in the default whitelist
pub fn exe_bytes() -> Vec<u8> {
    vec![0x4D, 0x5A, 0x90, 0x00, 0x03, 0x00, 0x00, 0x00]
}

pub fn write_file(dir: &Path, rel: &str, bytes: &[u8]) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, bytes).unwrap();
}

/// Asset-link entry names in the farm, placeholder and reserved
/// subdirectories excluded
pub fn farm_entries(links_dir: &Path) -> Vec<String> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(links_dir).unwrap() {
        let entry = entry.unwrap();
        if entry.file_type().unwrap().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name == ".touch" {
            continue;
        }
        names.push(name);
    }
    names.sort();
    names
}
