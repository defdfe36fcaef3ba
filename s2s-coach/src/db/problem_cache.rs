//! Persistent cache of resolved problem metadata
//!
//! Keyed by the normalized problem number. Writes are last-write-wins:
//! concurrent resolutions of the same identifier may both write, which
//! is harmless because the upstream record for a given key never
//! changes.

use sqlx::{Row, SqlitePool};

use s2s_common::models::ProblemMeta;
use s2s_common::{Error, Result};
use serde_json::Value;

/// Store a resolved problem under its normalized number
pub async fn put(pool: &SqlitePool, lc_num: &str, problem: &ProblemMeta) -> Result<()> {
    let problem_json = serde_json::to_string(problem)
        .map_err(|e| Error::Internal(format!("Failed to serialize problem: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO problem_cache (lc_num, problem_json)
        VALUES (?, ?)
        ON CONFLICT(lc_num) DO UPDATE SET problem_json = excluded.problem_json
        "#,
    )
    .bind(lc_num)
    .bind(&problem_json)
    .execute(pool)
    .await?;

    Ok(())
}

/// Look up a cached problem by normalized number.
///
/// Records written before the common schema settled are normalized on
/// the way out rather than rejected.
pub async fn get(pool: &SqlitePool, lc_num: &str) -> Result<Option<ProblemMeta>> {
    let row = sqlx::query("SELECT problem_json FROM problem_cache WHERE lc_num = ?")
        .bind(lc_num)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let raw: String = row.get("problem_json");
    let value: Value = serde_json::from_str(&raw)
        .map_err(|e| Error::Internal(format!("Corrupt cache entry for {}: {}", lc_num, e)))?;

    let problem = if value.get("title").is_some() {
        serde_json::from_value(value)
            .map_err(|e| Error::Internal(format!("Corrupt cache entry for {}: {}", lc_num, e)))?
    } else {
        crate::services::problems::normalize_raw(&value)
    };

    Ok(Some(problem))
}
