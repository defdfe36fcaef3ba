//! Mental model card database operations

use sqlx::{Row, SqlitePool};

use s2s_common::models::MentalModelCard;
use s2s_common::{Error, Result};

/// Insert or replace the card for a session.
///
/// Completing a session twice regenerates the card rather than failing
/// on the unique session constraint.
pub async fn upsert_card(pool: &SqlitePool, card: &MentalModelCard) -> Result<()> {
    let key_invariants = serde_json::to_string(&card.key_invariants)
        .map_err(|e| Error::Internal(format!("Failed to serialize key_invariants: {}", e)))?;
    let approach_evolution = serde_json::to_string(&card.approach_evolution)
        .map_err(|e| Error::Internal(format!("Failed to serialize approach_evolution: {}", e)))?;
    let unanswered_questions = serde_json::to_string(&card.unanswered_questions)
        .map_err(|e| Error::Internal(format!("Failed to serialize unanswered_questions: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO mental_model_cards (
            id, session_id, final_pattern, key_invariants,
            approach_evolution, unanswered_questions, full_transcript, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(session_id) DO UPDATE SET
            final_pattern = excluded.final_pattern,
            key_invariants = excluded.key_invariants,
            approach_evolution = excluded.approach_evolution,
            unanswered_questions = excluded.unanswered_questions,
            full_transcript = excluded.full_transcript
        "#,
    )
    .bind(&card.id)
    .bind(&card.session_id)
    .bind(&card.final_pattern)
    .bind(&key_invariants)
    .bind(&approach_evolution)
    .bind(&unanswered_questions)
    .bind(&card.full_transcript)
    .bind(card.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load the card for a session
pub async fn get_card(pool: &SqlitePool, session_id: &str) -> Result<Option<MentalModelCard>> {
    let row = sqlx::query(
        r#"
        SELECT id, session_id, final_pattern, key_invariants,
               approach_evolution, unanswered_questions, full_transcript, created_at
        FROM mental_model_cards
        WHERE session_id = ?
        "#,
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let key_invariants: String = row.get("key_invariants");
            let approach_evolution: String = row.get("approach_evolution");
            let unanswered_questions: String = row.get("unanswered_questions");
            let created_at: String = row.get("created_at");

            Ok(Some(MentalModelCard {
                id: row.get("id"),
                session_id: row.get("session_id"),
                final_pattern: row.get("final_pattern"),
                key_invariants: super::parse_json_list(&key_invariants),
                approach_evolution: super::parse_json_list(&approach_evolution),
                unanswered_questions: super::parse_json_list(&unanswered_questions),
                full_transcript: row.get("full_transcript"),
                created_at: super::parse_datetime(&created_at)?,
            }))
        }
        None => Ok(None),
    }
}
