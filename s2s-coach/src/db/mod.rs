//! Database access for s2s-coach
//!
//! SQLite via sqlx. Tables are bootstrapped on startup; rows are mapped
//! by hand, with JSON columns for list- and struct-valued fields.

pub mod analyses;
pub mod cards;
pub mod checkpoints;
pub mod problem_cache;
pub mod sessions;

use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Initialize database connection pool
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create tables if they don't exist
async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            lc_id TEXT,
            problem_json TEXT,
            full_transcript TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'active',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS checkpoints (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL,
            sequence_num INTEGER NOT NULL,
            pseudocode TEXT NOT NULL DEFAULT '',
            whiteboard_json TEXT NOT NULL DEFAULT '{}',
            labels TEXT NOT NULL DEFAULT '[]',
            audio_url TEXT,
            transcript_delta TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS analyses (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL,
            checkpoint_id TEXT,
            trigger_type TEXT NOT NULL,
            inferred_pattern TEXT NOT NULL DEFAULT '',
            confidence REAL NOT NULL DEFAULT 0.0,
            evidence TEXT NOT NULL DEFAULT '',
            visual_description TEXT NOT NULL DEFAULT '',
            snapshot_url TEXT,
            missing_pieces TEXT NOT NULL DEFAULT '[]',
            questions TEXT NOT NULL DEFAULT '[]',
            micro_hint TEXT NOT NULL DEFAULT '',
            reveal_outline TEXT,
            raw_llm_response TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mental_model_cards (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL UNIQUE,
            final_pattern TEXT NOT NULL DEFAULT '',
            key_invariants TEXT NOT NULL DEFAULT '[]',
            approach_evolution TEXT NOT NULL DEFAULT '[]',
            unanswered_questions TEXT NOT NULL DEFAULT '[]',
            full_transcript TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS problem_cache (
            lc_num TEXT PRIMARY KEY,
            problem_json TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!(
        "Database tables initialized (sessions, checkpoints, analyses, mental_model_cards, problem_cache)"
    );

    Ok(())
}

/// Parse an RFC 3339 timestamp column
pub(crate) fn parse_datetime(raw: &str) -> s2s_common::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| s2s_common::Error::Internal(format!("Failed to parse timestamp: {}", e)))
}

/// Deserialize a JSON list column, tolerating legacy/odd content
pub(crate) fn parse_json_list<T: serde::de::DeserializeOwned>(raw: &str) -> Vec<T> {
    serde_json::from_str(raw).unwrap_or_default()
}
