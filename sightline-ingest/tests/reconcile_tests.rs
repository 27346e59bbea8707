//! End-to-end reconciliation tests
//!
//! Each test builds a real submission working tree under a temp storage
//! root, mutates the raw content subtree the way the version-control layer
//! would, and reconciles against a file-backed SQLite database.

mod helpers;

use helpers::{exe_bytes, farm_entries, harness, jpeg_bytes, write_file};
use sightline_ingest::db::assets::load_assets_for_submission;
use sightline_ingest::models::Submission;

#[tokio::test]
async fn whitelisted_file_becomes_an_asset_and_others_are_skipped() {
    let h = harness().await;
    let submission = h.store.create(None).await.unwrap();
    let content = submission.content_dir(h.storage.path());

    write_file(&content, "cat.jpg", &jpeg_bytes(1));
    write_file(&content, "tool.exe", &exe_bytes());

    let report = h.reconciler.reconcile(&submission).await.unwrap();

    assert_eq!(report.processed, 1);
    assert_eq!(report.skipped, 1);
    assert!(report.errors.is_empty());
    assert_eq!(report.assets.len(), 1);
    assert_eq!(report.assets[0].path, "cat.jpg");
    assert_eq!(report.assets[0].mime_type, "image/jpeg");

    // Exactly one link, named by the asset identifier
    let links = submission.links_dir(h.storage.path());
    assert_eq!(
        farm_entries(&links),
        vec![report.assets[0].link_file_name()]
    );
}

#[tokio::test]
async fn reconcile_is_idempotent_on_an_unchanged_tree() {
    let h = harness().await;
    let submission = h.store.create(None).await.unwrap();
    let content = submission.content_dir(h.storage.path());

    write_file(&content, "a.jpg", &jpeg_bytes(1));
    write_file(&content, "nested/b.jpg", &jpeg_bytes(2));

    h.reconciler.reconcile(&submission).await.unwrap();
    let rows_after_first = load_assets_for_submission(&h.pool, submission.guid)
        .await
        .unwrap();

    let links = submission.links_dir(h.storage.path());
    let farm_after_first = farm_entries(&links);

    let second = h.reconciler.reconcile(&submission).await.unwrap();
    let rows_after_second = load_assets_for_submission(&h.pool, submission.guid)
        .await
        .unwrap();

    // No inserts, no updates with changed values, no deletes
    assert_eq!(rows_after_first, rows_after_second);
    assert_eq!(farm_entries(&links), farm_after_first);
    assert_eq!(second.processed, 2);
    assert!(second.errors.is_empty());
}

#[tokio::test]
async fn renamed_file_keeps_its_identifier() {
    let h = harness().await;
    let submission = h.store.create(None).await.unwrap();
    let content = submission.content_dir(h.storage.path());

    write_file(&content, "a.jpg", &jpeg_bytes(7));
    let first = h.reconciler.reconcile(&submission).await.unwrap();
    let original_guid = first.assets[0].guid;

    std::fs::rename(content.join("a.jpg"), content.join("b.jpg")).unwrap();
    let second = h.reconciler.reconcile(&submission).await.unwrap();

    assert_eq!(second.assets.len(), 1);
    assert_eq!(second.assets[0].guid, original_guid);
    assert_eq!(second.assets[0].path, "b.jpg");

    let rows = load_assets_for_submission(&h.pool, submission.guid)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].path, "b.jpg");
}

#[tokio::test]
async fn removed_file_is_orphaned_and_its_link_deleted() {
    let h = harness().await;
    let submission = h.store.create(None).await.unwrap();
    let content = submission.content_dir(h.storage.path());
    let links = submission.links_dir(h.storage.path());

    write_file(&content, "a.jpg", &jpeg_bytes(1));
    write_file(&content, "b.jpg", &jpeg_bytes(2));

    let first = h.reconciler.reconcile(&submission).await.unwrap();
    assert_eq!(first.assets.len(), 2);
    assert_eq!(farm_entries(&links).len(), 2);

    let doomed = first
        .assets
        .iter()
        .find(|a| a.path == "b.jpg")
        .unwrap()
        .clone();

    std::fs::remove_file(content.join("b.jpg")).unwrap();
    let second = h.reconciler.reconcile(&submission).await.unwrap();

    assert_eq!(second.assets.len(), 1);
    assert_eq!(second.assets[0].path, "a.jpg");

    let rows = load_assets_for_submission(&h.pool, submission.guid)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows.iter().all(|a| a.guid != doomed.guid));
    assert_eq!(farm_entries(&links), vec![second.assets[0].link_file_name()]);
}

#[tokio::test]
async fn duplicate_content_yields_a_single_asset() {
    let h = harness().await;
    let submission = h.store.create(None).await.unwrap();
    let content = submission.content_dir(h.storage.path());

    write_file(&content, "a.jpg", &jpeg_bytes(5));
    write_file(&content, "copy.jpg", &jpeg_bytes(5));

    let report = h.reconciler.reconcile(&submission).await.unwrap();

    // Both files hash to the same content identifier; the first one in walk
    // order wins and the other is counted as skipped
    assert_eq!(report.processed, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.assets.len(), 1);
    assert!(["a.jpg", "copy.jpg"].contains(&report.assets[0].path.as_str()));
}

#[tokio::test]
async fn edited_file_recycles_its_identifier_from_the_farm() {
    let h = harness().await;
    let submission = h.store.create(None).await.unwrap();
    let content = submission.content_dir(h.storage.path());

    write_file(&content, "a.jpg", &jpeg_bytes(1));
    let first = h.reconciler.reconcile(&submission).await.unwrap();
    let original = first.assets[0].clone();

    // Same path, new bytes: new semantic identity
    write_file(&content, "a.jpg", &jpeg_bytes(9));
    let second = h.reconciler.reconcile(&submission).await.unwrap();

    assert_eq!(second.assets.len(), 1);
    let replacement = &second.assets[0];

    // The identifier assigned by the prior link survives the edit
    assert_eq!(replacement.guid, original.guid);
    assert_ne!(replacement.semantic_guid, original.semantic_guid);
    assert_ne!(replacement.content_hash, original.content_hash);

    // Exactly one row remains despite the identity change
    let rows = load_assets_for_submission(&h.pool, submission.guid)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].semantic_guid, replacement.semantic_guid);
}

#[tokio::test]
async fn identical_content_in_different_submissions_stays_separate() {
    let h = harness().await;
    let first_sub = h.store.create(None).await.unwrap();
    let second_sub = h.store.create(None).await.unwrap();

    write_file(
        &first_sub.content_dir(h.storage.path()),
        "shared.jpg",
        &jpeg_bytes(3),
    );
    write_file(
        &second_sub.content_dir(h.storage.path()),
        "shared.jpg",
        &jpeg_bytes(3),
    );

    let first = h.reconciler.reconcile(&first_sub).await.unwrap();
    let second = h.reconciler.reconcile(&second_sub).await.unwrap();

    // Same content identifier, distinct semantic identities
    assert_eq!(
        first.assets[0].content_guid,
        second.assets[0].content_guid
    );
    assert_ne!(
        first.assets[0].semantic_guid,
        second.assets[0].semantic_guid
    );
}

#[tokio::test]
async fn empty_submission_reconciles_to_nothing() {
    let h = harness().await;
    let submission = h.store.create(None).await.unwrap();

    let report = h.reconciler.reconcile(&submission).await.unwrap();

    assert_eq!(report.processed, 0);
    assert_eq!(report.skipped, 0);
    assert!(report.assets.is_empty());
    assert!(farm_entries(&submission.links_dir(h.storage.path())).is_empty());
}

#[tokio::test]
async fn unmaterialized_submission_is_a_fatal_error() {
    let h = harness().await;

    // Row-less, directory-less submission: the caller broke the contract
    let ghost = Submission::new(None);
    let result = h.reconciler.reconcile(&ghost).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn import_then_reconcile_end_to_end() {
    let h = harness().await;
    let submission = h.store.create(Some("camera trap 12".to_string())).await.unwrap();

    let source = tempfile::TempDir::new().unwrap();
    write_file(source.path(), "day1/dawn.jpg", &jpeg_bytes(11));
    write_file(source.path(), "day1/notes.exe", &exe_bytes());
    write_file(source.path(), "day2/dusk.jpg", &jpeg_bytes(12));

    let copied = h
        .store
        .import_local(&submission, source.path())
        .await
        .unwrap();
    assert_eq!(copied, 3);

    let report = h.reconciler.reconcile(&submission).await.unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.skipped, 1);

    let paths: Vec<&str> = report.assets.iter().map(|a| a.path.as_str()).collect();
    assert_eq!(paths, vec!["day1/dawn.jpg", "day2/dusk.jpg"]);
}
