//! Session database operations

use sqlx::{Row, SqlitePool};

use s2s_common::models::{ProblemMeta, Session, SessionStatus};
use s2s_common::{Error, Result};

/// Insert a new session row
pub async fn insert_session(pool: &SqlitePool, session: &Session) -> Result<()> {
    let problem_json = session
        .problem
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| Error::Internal(format!("Failed to serialize problem: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO sessions (id, lc_id, problem_json, full_transcript, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&session.id)
    .bind(&session.lc_id)
    .bind(&problem_json)
    .bind(&session.full_transcript)
    .bind(session.status.as_str())
    .bind(session.created_at.to_rfc3339())
    .bind(session.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a session by id
pub async fn get_session(pool: &SqlitePool, session_id: &str) -> Result<Option<Session>> {
    let row = sqlx::query(
        r#"
        SELECT id, lc_id, problem_json, full_transcript, status, created_at, updated_at
        FROM sessions
        WHERE id = ?
        "#,
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let problem_json: Option<String> = row.get("problem_json");
            let problem: Option<ProblemMeta> = problem_json
                .as_deref()
                .and_then(|raw| serde_json::from_str(raw).ok());

            let status: String = row.get("status");
            let created_at: String = row.get("created_at");
            let updated_at: String = row.get("updated_at");

            Ok(Some(Session {
                id: row.get("id"),
                lc_id: row.get("lc_id"),
                problem,
                full_transcript: row.get("full_transcript"),
                status: SessionStatus::parse(&status),
                created_at: super::parse_datetime(&created_at)?,
                updated_at: super::parse_datetime(&updated_at)?,
            }))
        }
        None => Ok(None),
    }
}

/// Re-point a session at newly resolved problem metadata
pub async fn update_problem(
    pool: &SqlitePool,
    session_id: &str,
    lc_id: Option<&str>,
    problem: &ProblemMeta,
) -> Result<()> {
    let problem_json = serde_json::to_string(problem)
        .map_err(|e| Error::Internal(format!("Failed to serialize problem: {}", e)))?;

    sqlx::query(
        "UPDATE sessions SET lc_id = ?, problem_json = ?, updated_at = ? WHERE id = ?",
    )
    .bind(lc_id)
    .bind(&problem_json)
    .bind(chrono::Utc::now().to_rfc3339())
    .bind(session_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Mark a session completed
pub async fn mark_completed(pool: &SqlitePool, session_id: &str) -> Result<()> {
    sqlx::query("UPDATE sessions SET status = 'completed', updated_at = ? WHERE id = ?")
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(session_id)
        .execute(pool)
        .await?;

    Ok(())
}
