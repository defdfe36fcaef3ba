//! Solution verification API handler

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::services::verifier::{self, VerifyReport};
use crate::{db, AppState};

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub session_id: String,
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub problem_title: String,
}

/// POST /verify
///
/// An unknown session verifies against an empty problem rather than
/// failing; the verdict itself reports anything actionable.
pub async fn verify(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> ApiResult<Json<VerifyReport>> {
    let problem = db::sessions::get_session(&state.db, &request.session_id)
        .await?
        .and_then(|s| s.problem)
        .unwrap_or_default();

    let report = verifier::verify_code(
        state.reasoner.as_ref(),
        &request.code,
        &request.language,
        &problem,
        &request.problem_title,
    )
    .await;

    Ok(Json(report))
}
