//! Asset database operations

use crate::models::Asset;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Load all assets belonging to a submission, ordered by path
pub async fn load_assets_for_submission(
    pool: &SqlitePool,
    submission_guid: Uuid,
) -> Result<Vec<Asset>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, semantic_guid, submission_guid, path, extension,
               mime_type, signature, size_bytes, content_hash, content_guid,
               created_at, updated_at
        FROM assets
        WHERE submission_guid = ?
        ORDER BY path
        "#,
    )
    .bind(submission_guid.to_string())
    .fetch_all(pool)
    .await
    .context("Failed to load assets")?;

    let mut assets = Vec::with_capacity(rows.len());
    for row in &rows {
        assets.push(asset_from_row(row)?);
    }

    Ok(assets)
}

/// Apply one reconciliation pass's insert and update batches in a single
/// transaction.
///
/// Inserts upsert on the primary identifier: a recycled guid that still names
/// a row whose content has since changed is overwritten in place rather than
/// colliding. Updates address existing rows by guid and only touch the
/// mutable fields.
pub async fn apply_upserts(pool: &SqlitePool, inserts: &[Asset], updates: &[Asset]) -> Result<()> {
    if inserts.is_empty() && updates.is_empty() {
        return Ok(());
    }

    let mut tx = pool.begin().await?;

    for asset in inserts {
        sqlx::query(
            r#"
            INSERT INTO assets
                (guid, semantic_guid, submission_guid, path, extension,
                 mime_type, signature, size_bytes, content_hash, content_guid,
                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(guid) DO UPDATE SET
                semantic_guid = excluded.semantic_guid,
                path = excluded.path,
                extension = excluded.extension,
                mime_type = excluded.mime_type,
                signature = excluded.signature,
                size_bytes = excluded.size_bytes,
                content_hash = excluded.content_hash,
                content_guid = excluded.content_guid,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(asset.guid.to_string())
        .bind(asset.semantic_guid.to_string())
        .bind(asset.submission_guid.to_string())
        .bind(&asset.path)
        .bind(&asset.extension)
        .bind(&asset.mime_type)
        .bind(&asset.signature)
        .bind(asset.size_bytes)
        .bind(&asset.content_hash)
        .bind(asset.content_guid.to_string())
        .bind(asset.created_at.to_rfc3339())
        .bind(asset.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to insert asset {}", asset.guid))?;
    }

    for asset in updates {
        sqlx::query(
            r#"
            UPDATE assets
            SET path = ?, extension = ?, mime_type = ?, signature = ?,
                size_bytes = ?, content_hash = ?, content_guid = ?,
                updated_at = ?
            WHERE guid = ?
            "#,
        )
        .bind(&asset.path)
        .bind(&asset.extension)
        .bind(&asset.mime_type)
        .bind(&asset.signature)
        .bind(asset.size_bytes)
        .bind(&asset.content_hash)
        .bind(asset.content_guid.to_string())
        .bind(asset.updated_at.to_rfc3339())
        .bind(asset.guid.to_string())
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to update asset {}", asset.guid))?;
    }

    tx.commit().await?;
    Ok(())
}

/// Delete a batch of assets by identifier in a single transaction
pub async fn delete_assets(pool: &SqlitePool, guids: &[Uuid]) -> Result<()> {
    if guids.is_empty() {
        return Ok(());
    }

    let mut tx = pool.begin().await?;

    for guid in guids {
        sqlx::query("DELETE FROM assets WHERE guid = ?")
            .bind(guid.to_string())
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to delete asset {guid}"))?;
    }

    tx.commit().await?;
    Ok(())
}

/// Count assets belonging to a submission
pub async fn count_assets(pool: &SqlitePool, submission_guid: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM assets WHERE submission_guid = ?")
        .bind(submission_guid.to_string())
        .fetch_one(pool)
        .await?;
    Ok(count)
}

fn asset_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Asset> {
    let guid_str: String = row.get("guid");
    let semantic_str: String = row.get("semantic_guid");
    let submission_str: String = row.get("submission_guid");
    let content_str: String = row.get("content_guid");
    let created_str: String = row.get("created_at");
    let updated_str: String = row.get("updated_at");

    Ok(Asset {
        guid: Uuid::parse_str(&guid_str)?,
        semantic_guid: Uuid::parse_str(&semantic_str)?,
        submission_guid: Uuid::parse_str(&submission_str)?,
        path: row.get("path"),
        extension: row.get("extension"),
        mime_type: row.get("mime_type"),
        signature: row.get("signature"),
        size_bytes: row.get("size_bytes"),
        content_hash: row.get("content_hash"),
        content_guid: Uuid::parse_str(&content_str)?,
        created_at: DateTime::parse_from_rfc3339(&created_str)?.with_timezone(&Utc),
        updated_at: DateTime::parse_from_rfc3339(&updated_str)?.with_timezone(&Utc),
    })
}
