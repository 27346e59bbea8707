//! Reconciliation engine
//!
//! Invoked after every mutation of a submission's raw content subtree
//! (initial import, pull, commit). Produces the authoritative asset set for
//! the current tree snapshot: new content becomes new rows, re-observed
//! content updates rows in place, and content that disappeared is deleted
//! along with its link. Re-running against an unchanged tree performs no
//! database writes and leaves an identical symlink farm.

use crate::db;
use crate::models::{Asset, CandidateFile, ResolvedCandidate, Submission};
use crate::services::file_classifier::{Classification, FileClassifier};
use crate::services::{content_hasher, file_walker, identity_resolver, symlink_farm};
use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use sightline_common::config::IngestConfig;
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Aggregate outcome of one reconciliation pass
#[derive(Debug, Serialize)]
pub struct ReconcileReport {
    pub submission_guid: Uuid,
    /// Files now managed as assets
    pub processed: usize,
    /// Files excluded (hidden, unsupported type, duplicate content)
    pub skipped: usize,
    /// Per-file and per-link failures; never fatal to the pass
    pub errors: Vec<String>,
    /// The authoritative asset set for this snapshot
    pub assets: Vec<Asset>,
}

/// Reconciles a submission's content tree against its asset records
pub struct Reconciler {
    db: SqlitePool,
    storage_root: PathBuf,
    classifier: FileClassifier,
}

/// Everything the blocking scan phase hands back to the async side
struct ScanOutcome {
    resolved: Vec<ResolvedCandidate>,
    skipped: usize,
    errors: Vec<String>,
}

impl Reconciler {
    pub fn new(db: SqlitePool, config: &IngestConfig) -> Self {
        Self {
            db,
            storage_root: config.storage_root.clone(),
            classifier: FileClassifier::new(&config.accepted_mime_types),
        }
    }

    /// Run one reconciliation pass over `submission`.
    ///
    /// Fatal only when the submission's working directories are missing
    /// (the caller must materialize the tree before invoking this) or a
    /// database transaction fails; per-file trouble lands in the report.
    pub async fn reconcile(&self, submission: &Submission) -> Result<ReconcileReport> {
        let root = submission.root_dir(&self.storage_root);
        let content_dir = submission.content_dir(&self.storage_root);
        let links_dir = submission.links_dir(&self.storage_root);

        for dir in [&root, &content_dir, &links_dir] {
            if !dir.is_dir() {
                bail!(
                    "Submission {} is not materialized: missing {}",
                    submission.guid,
                    dir.display()
                );
            }
        }

        tracing::debug!(submission = %submission.guid, "Starting reconciliation pass");

        // Walking, sniffing, and hashing are all blocking filesystem work
        let submission_guid = submission.guid;
        let classifier = self.classifier.clone();
        let scan_links_dir = links_dir.clone();
        let scan = tokio::task::spawn_blocking(move || {
            scan_submission(submission_guid, &content_dir, &scan_links_dir, &classifier)
        })
        .await
        .context("Scan task failed")??;

        let mut errors = scan.errors;
        let skipped = scan.skipped;

        // Partition candidates against the previously known asset set
        let previous = db::assets::load_assets_for_submission(&self.db, submission.guid).await?;
        let prev_by_semantic: HashMap<Uuid, &Asset> =
            previous.iter().map(|a| (a.semantic_guid, a)).collect();

        let mut inserts = Vec::new();
        let mut updates = Vec::new();
        let mut current = Vec::new();
        for candidate in scan.resolved {
            match prev_by_semantic.get(&candidate.semantic_guid) {
                Some(existing) => {
                    // Same semantic identity: the row keeps its identifier
                    // and creation time, every other field follows the file
                    let mut asset = candidate.into_asset(submission.guid);
                    asset.guid = existing.guid;
                    asset.created_at = existing.created_at;

                    if existing.same_content_as(&asset) {
                        current.push((*existing).clone());
                    } else {
                        updates.push(asset.clone());
                        current.push(asset);
                    }
                }
                None => {
                    let asset = candidate.into_asset(submission.guid);
                    inserts.push(asset.clone());
                    current.push(asset);
                }
            }
        }
        current.sort_by(|a, b| a.path.cmp(&b.path));

        db::assets::apply_upserts(&self.db, &inserts, &updates).await?;

        // Orphans: previously tracked, absent from this snapshot. Guids are
        // checked as well so a row consumed by identifier recycling is not
        // deleted out from under its new semantic identity.
        let current_semantics: HashSet<Uuid> = current.iter().map(|a| a.semantic_guid).collect();
        let current_guids: HashSet<Uuid> = current.iter().map(|a| a.guid).collect();
        let orphans: Vec<Uuid> = previous
            .iter()
            .filter(|a| {
                !current_semantics.contains(&a.semantic_guid) && !current_guids.contains(&a.guid)
            })
            .map(|a| a.guid)
            .collect();

        if !orphans.is_empty() {
            tracing::info!(
                submission = %submission.guid,
                count = orphans.len(),
                "Deleting orphaned assets"
            );
        }
        db::assets::delete_assets(&self.db, &orphans).await?;

        // Rebuild the farm last so the link set mirrors the new rows
        let rebuild_assets = current.clone();
        let rebuild = tokio::task::spawn_blocking(move || {
            symlink_farm::rebuild(&links_dir, &rebuild_assets)
        })
        .await
        .context("Farm rebuild task failed")??;
        errors.extend(rebuild.errors);

        let report = ReconcileReport {
            submission_guid: submission.guid,
            processed: current.len(),
            skipped,
            errors,
            assets: current,
        };

        tracing::info!(
            submission = %submission.guid,
            processed = report.processed,
            skipped = report.skipped,
            errors = report.errors.len(),
            "Reconciliation pass complete"
        );

        Ok(report)
    }
}

/// Blocking scan phase: snapshot prior links, walk, classify, hash, resolve.
///
/// The prior-target snapshot is taken first and in full; the farm is only
/// mutated after the async side has the authoritative asset set.
fn scan_submission(
    submission_guid: Uuid,
    content_dir: &Path,
    links_dir: &Path,
    classifier: &FileClassifier,
) -> Result<ScanOutcome> {
    let prior_targets = symlink_farm::snapshot_prior_targets(links_dir)?;

    let content_root = content_dir
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", content_dir.display()))?;

    let walk = file_walker::walk(&content_root)?;
    let mut errors = walk.errors;
    let mut skipped = 0usize;

    let mut candidates = Vec::new();
    for path in walk.files {
        match classifier.classify(&path) {
            Ok(Classification::Accepted {
                mime_type,
                signature,
            }) => {
                let metadata = match std::fs::metadata(&path) {
                    Ok(metadata) => metadata,
                    Err(e) => {
                        errors.push(format!("{}: {}", path.display(), e));
                        continue;
                    }
                };

                let rel_path = path
                    .strip_prefix(&content_root)
                    .context("Walked file escaped the content root")?
                    .to_string_lossy()
                    .to_string();
                let extension = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.to_lowercase())
                    .unwrap_or_default();

                candidates.push(CandidateFile {
                    size_bytes: metadata.len() as i64,
                    abs_path: path,
                    rel_path,
                    extension,
                    mime_type,
                    signature,
                });
            }
            Ok(Classification::Excluded(reason)) => {
                tracing::debug!(path = %path.display(), ?reason, "Excluded from management");
                skipped += 1;
            }
            Err(e) => {
                errors.push(format!("{}: {}", path.display(), e));
            }
        }
    }

    // Hash surviving candidates in parallel. Each worker touches only its
    // own file; results come back in input order, not completion order.
    let digests: Vec<Option<u64>> = candidates
        .par_iter()
        .map(|candidate| content_hasher::digest(&candidate.abs_path))
        .collect();

    let mut resolved = Vec::with_capacity(candidates.len());
    let mut seen = HashSet::new();
    for (candidate, digest) in candidates.into_iter().zip(digests) {
        let digest = match digest {
            Some(digest) => digest,
            None => {
                errors.push(format!(
                    "{}: unreadable while hashing",
                    candidate.abs_path.display()
                ));
                continue;
            }
        };

        let content_guid = content_hasher::identifier_from_digest(digest);
        let identity = identity_resolver::resolve(
            submission_guid,
            content_guid,
            &candidate.abs_path,
            &prior_targets,
        );

        // Duplicate content within one pass maps to one semantic identity;
        // the first candidate in walk order wins.
        if !seen.insert(identity.semantic_guid) {
            tracing::debug!(path = %candidate.rel_path, "Duplicate content, keeping first occurrence");
            skipped += 1;
            continue;
        }

        resolved.push(ResolvedCandidate {
            file: candidate,
            content_hash: digest,
            content_guid,
            semantic_guid: identity.semantic_guid,
            asset_guid: identity.asset_guid,
        });
    }

    Ok(ScanOutcome {
        resolved,
        skipped,
        errors,
    })
}
