//! Submission database operations

use crate::models::Submission;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Insert a submission row
pub async fn save_submission(pool: &SqlitePool, submission: &Submission) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO submissions (guid, description, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(submission.guid.to_string())
    .bind(&submission.description)
    .bind(submission.created_at.to_rfc3339())
    .bind(submission.updated_at.to_rfc3339())
    .execute(pool)
    .await
    .context("Failed to save submission")?;

    Ok(())
}

/// Load a submission by identifier
pub async fn load_submission(pool: &SqlitePool, guid: Uuid) -> Result<Option<Submission>> {
    let row = sqlx::query(
        r#"
        SELECT guid, description, created_at, updated_at
        FROM submissions
        WHERE guid = ?
        "#,
    )
    .bind(guid.to_string())
    .fetch_optional(pool)
    .await
    .context("Failed to load submission")?;

    match row {
        Some(row) => Ok(Some(submission_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Load all submissions, oldest first
pub async fn list_submissions(pool: &SqlitePool) -> Result<Vec<Submission>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, description, created_at, updated_at
        FROM submissions
        ORDER BY created_at
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to list submissions")?;

    let mut submissions = Vec::with_capacity(rows.len());
    for row in &rows {
        submissions.push(submission_from_row(row)?);
    }

    Ok(submissions)
}

/// Delete a submission row and its assets in one transaction.
///
/// The asset delete is explicit even though the schema cascades, so ownership
/// does not depend on the foreign_keys pragma being live on the connection.
pub async fn delete_submission(pool: &SqlitePool, guid: Uuid) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM assets WHERE submission_guid = ?")
        .bind(guid.to_string())
        .execute(&mut *tx)
        .await
        .context("Failed to delete submission assets")?;

    sqlx::query("DELETE FROM submissions WHERE guid = ?")
        .bind(guid.to_string())
        .execute(&mut *tx)
        .await
        .context("Failed to delete submission")?;

    tx.commit().await?;
    Ok(())
}

fn submission_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Submission> {
    let guid_str: String = row.get("guid");
    let created_str: String = row.get("created_at");
    let updated_str: String = row.get("updated_at");

    Ok(Submission {
        guid: Uuid::parse_str(&guid_str)?,
        description: row.get("description"),
        created_at: DateTime::parse_from_rfc3339(&created_str)?.with_timezone(&Utc),
        updated_at: DateTime::parse_from_rfc3339(&updated_str)?.with_timezone(&Utc),
    })
}
