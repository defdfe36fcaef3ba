//! Analysis database operations
//!
//! Analyses are the authoritative history of coaching turns: written
//! once per turn, never mutated.

use sqlx::{Row, SqlitePool};

use s2s_common::models::Analysis;
use s2s_common::{Error, Result};

/// Insert a new analysis row
pub async fn insert_analysis(pool: &SqlitePool, analysis: &Analysis) -> Result<()> {
    let missing_pieces = serde_json::to_string(&analysis.missing_pieces)
        .map_err(|e| Error::Internal(format!("Failed to serialize missing_pieces: {}", e)))?;
    let questions = serde_json::to_string(&analysis.questions)
        .map_err(|e| Error::Internal(format!("Failed to serialize questions: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO analyses (
            id, session_id, checkpoint_id, trigger_type, inferred_pattern,
            confidence, evidence, visual_description, snapshot_url,
            missing_pieces, questions, micro_hint, reveal_outline,
            raw_llm_response, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&analysis.id)
    .bind(&analysis.session_id)
    .bind(&analysis.checkpoint_id)
    .bind(&analysis.trigger_type)
    .bind(&analysis.inferred_pattern)
    .bind(analysis.confidence)
    .bind(&analysis.evidence)
    .bind(&analysis.visual_description)
    .bind(&analysis.snapshot_url)
    .bind(&missing_pieces)
    .bind(&questions)
    .bind(&analysis.micro_hint)
    .bind(&analysis.reveal_outline)
    .bind(&analysis.raw_llm_response)
    .bind(analysis.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load all analyses for a session in creation order
pub async fn list_for_session(pool: &SqlitePool, session_id: &str) -> Result<Vec<Analysis>> {
    let rows = sqlx::query(
        r#"
        SELECT id, session_id, checkpoint_id, trigger_type, inferred_pattern,
               confidence, evidence, visual_description, snapshot_url,
               missing_pieces, questions, micro_hint, reveal_outline,
               raw_llm_response, created_at
        FROM analyses
        WHERE session_id = ?
        ORDER BY created_at ASC
        "#,
    )
    .bind(session_id)
    .fetch_all(pool)
    .await?;

    let mut analyses = Vec::with_capacity(rows.len());
    for row in rows {
        let missing_pieces: String = row.get("missing_pieces");
        let questions: String = row.get("questions");
        let created_at: String = row.get("created_at");

        analyses.push(Analysis {
            id: row.get("id"),
            session_id: row.get("session_id"),
            checkpoint_id: row.get("checkpoint_id"),
            trigger_type: row.get("trigger_type"),
            inferred_pattern: row.get("inferred_pattern"),
            confidence: row.get("confidence"),
            evidence: row.get("evidence"),
            visual_description: row.get("visual_description"),
            snapshot_url: row.get("snapshot_url"),
            missing_pieces: super::parse_json_list(&missing_pieces),
            questions: super::parse_json_list(&questions),
            micro_hint: row.get("micro_hint"),
            reveal_outline: row.get("reveal_outline"),
            raw_llm_response: row.get("raw_llm_response"),
            created_at: super::parse_datetime(&created_at)?,
        });
    }

    Ok(analyses)
}

/// Count analyses belonging to a session
pub async fn count_for_session(pool: &SqlitePool, session_id: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM analyses WHERE session_id = ?")
        .bind(session_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}
