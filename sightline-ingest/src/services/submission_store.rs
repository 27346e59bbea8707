//! Submission lifecycle: creation, local import, deletion
//!
//! The version-control layer that normally materializes and mutates
//! submission trees is an external collaborator; this store covers the
//! lifecycle pieces the ingest side owns: directory layout, database rows,
//! and the explicit ownership cascade on delete.

use crate::db;
use crate::models::{Submission, DERIVED_DIR, KEEPALIVE_NAME};
use anyhow::{ensure, Context, Result};
use sightline_common::config::IngestConfig;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use walkdir::WalkDir;

/// Manages submission rows and their backing working directories
pub struct SubmissionStore {
    db: SqlitePool,
    storage_root: PathBuf,
}

impl SubmissionStore {
    pub fn new(db: SqlitePool, config: &IngestConfig) -> Self {
        Self {
            db,
            storage_root: config.storage_root.clone(),
        }
    }

    /// Create a submission: mint an identifier, materialize the working
    /// directory layout, insert the row.
    pub async fn create(&self, description: Option<String>) -> Result<Submission> {
        let submission = Submission::new(description);
        self.materialize_layout(&submission)
            .with_context(|| format!("Failed to materialize submission {}", submission.guid))?;
        db::submissions::save_submission(&self.db, &submission).await?;

        tracing::info!(submission = %submission.guid, "Created submission");
        Ok(submission)
    }

    /// Load a submission, failing when unknown
    pub async fn load(&self, guid: Uuid) -> Result<Submission> {
        db::submissions::load_submission(&self.db, guid)
            .await?
            .with_context(|| format!("Submission {guid} not found"))
    }

    /// All known submissions, oldest first
    pub async fn list(&self) -> Result<Vec<Submission>> {
        db::submissions::list_submissions(&self.db).await
    }

    /// Copy a local source tree into the raw content subtree.
    ///
    /// Stands in for the version-control layer's initial import and pull
    /// operations. Symlinks in the source are not imported.
    pub async fn import_local(&self, submission: &Submission, source: &Path) -> Result<usize> {
        ensure!(
            source.is_dir(),
            "Import source is not a directory: {}",
            source.display()
        );

        let content_dir = submission.content_dir(&self.storage_root);
        let source = source.to_path_buf();
        let copied = tokio::task::spawn_blocking(move || copy_tree(&source, &content_dir))
            .await
            .context("Import task failed")??;

        tracing::info!(submission = %submission.guid, files = copied, "Imported local tree");
        Ok(copied)
    }

    /// Delete a submission, its assets, and its backing directory.
    ///
    /// The submission exclusively owns its assets, so the cascade is
    /// explicit: asset rows first, then the submission row, then the
    /// working tree.
    pub async fn delete(&self, submission: &Submission) -> Result<()> {
        db::submissions::delete_submission(&self.db, submission.guid).await?;

        let root = submission.root_dir(&self.storage_root);
        if root.exists() {
            std::fs::remove_dir_all(&root)
                .with_context(|| format!("Failed to remove {}", root.display()))?;
        }

        tracing::info!(submission = %submission.guid, "Deleted submission");
        Ok(())
    }

    fn materialize_layout(&self, submission: &Submission) -> std::io::Result<()> {
        let content_dir = submission.content_dir(&self.storage_root);
        let links_dir = submission.links_dir(&self.storage_root);

        std::fs::create_dir_all(&content_dir)?;
        std::fs::create_dir_all(links_dir.join(DERIVED_DIR))?;

        // Keep-alive placeholders so the farm directories survive
        // version-control operations even when empty
        std::fs::write(links_dir.join(KEEPALIVE_NAME), b"")?;
        std::fs::write(links_dir.join(DERIVED_DIR).join(KEEPALIVE_NAME), b"")?;

        Ok(())
    }
}

/// Recursive best-effort tree copy; returns the number of files copied
fn copy_tree(source: &Path, dest: &Path) -> Result<usize> {
    let mut copied = 0;

    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(source)?;
        if rel.as_os_str().is_empty() {
            continue;
        }

        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
            copied += 1;
        }
    }

    Ok(copied)
}
