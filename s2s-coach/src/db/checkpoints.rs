//! Checkpoint database operations

use sqlx::{Row, SqlitePool};

use s2s_common::models::Checkpoint;
use s2s_common::{Error, Result};

/// Insert a new checkpoint row.
///
/// `sequence_num` is stored exactly as supplied; duplicate or
/// out-of-order values are accepted.
pub async fn insert_checkpoint(pool: &SqlitePool, checkpoint: &Checkpoint) -> Result<()> {
    let labels = serde_json::to_string(&checkpoint.labels)
        .map_err(|e| Error::Internal(format!("Failed to serialize labels: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO checkpoints (
            id, session_id, sequence_num, pseudocode, whiteboard_json,
            labels, audio_url, transcript_delta, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&checkpoint.id)
    .bind(&checkpoint.session_id)
    .bind(checkpoint.sequence_num)
    .bind(&checkpoint.pseudocode)
    .bind(&checkpoint.whiteboard_json)
    .bind(&labels)
    .bind(&checkpoint.audio_url)
    .bind(&checkpoint.transcript_delta)
    .bind(checkpoint.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load the most recent checkpoint for a session (highest sequence number)
pub async fn latest_checkpoint(pool: &SqlitePool, session_id: &str) -> Result<Option<Checkpoint>> {
    let row = sqlx::query(
        r#"
        SELECT id, session_id, sequence_num, pseudocode, whiteboard_json,
               labels, audio_url, transcript_delta, created_at
        FROM checkpoints
        WHERE session_id = ?
        ORDER BY sequence_num DESC
        LIMIT 1
        "#,
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let labels: String = row.get("labels");
            let created_at: String = row.get("created_at");

            Ok(Some(Checkpoint {
                id: row.get("id"),
                session_id: row.get("session_id"),
                sequence_num: row.get("sequence_num"),
                pseudocode: row.get("pseudocode"),
                whiteboard_json: row.get("whiteboard_json"),
                labels: super::parse_json_list(&labels),
                audio_url: row.get("audio_url"),
                transcript_delta: row.get("transcript_delta"),
                created_at: super::parse_datetime(&created_at)?,
            }))
        }
        None => Ok(None),
    }
}

/// Count checkpoints belonging to a session
pub async fn count_for_session(pool: &SqlitePool, session_id: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM checkpoints WHERE session_id = ?")
        .bind(session_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Attach a transcript fragment to its checkpoint and append it to the
/// session's cumulative transcript, as a single transaction.
///
/// The session append uses a newline separator unless the transcript was
/// empty. A missing checkpoint row is tolerated (zero rows updated); the
/// session transcript still grows.
pub async fn attach_transcript_delta(
    pool: &SqlitePool,
    session_id: &str,
    checkpoint_id: &str,
    delta: &str,
) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE checkpoints SET transcript_delta = ? WHERE id = ?")
        .bind(delta)
        .bind(checkpoint_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        UPDATE sessions
        SET full_transcript = CASE
                WHEN full_transcript = '' THEN ?
                ELSE full_transcript || char(10) || ?
            END,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(delta)
    .bind(delta)
    .bind(chrono::Utc::now().to_rfc3339())
    .bind(session_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(())
}
