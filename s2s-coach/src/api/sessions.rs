//! Session lifecycle API handlers

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use s2s_common::models::{
    ApproachStep, MentalModelCard, ProblemMeta, Session, SessionStatus,
};

use crate::error::{ApiError, ApiResult};
use crate::{db, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub lc_id: Option<String>,
    pub problem_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub problem: Option<ProblemMeta>,
    pub needs_manual_input: bool,
    pub created_at: chrono::DateTime<Utc>,
}

/// POST /sessions
///
/// Creates a session, resolving problem metadata up front. A resolution
/// miss is not an error; the client is told to supply the problem text
/// manually.
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> ApiResult<Json<CreateSessionResponse>> {
    let problem = state
        .resolver
        .resolve(request.lc_id.as_deref(), request.problem_text.as_deref())
        .await;

    let no_text = request
        .problem_text
        .as_deref()
        .map_or(true, |t| t.trim().is_empty());
    let needs_manual_input = problem.is_none() && no_text;

    let now = Utc::now();
    let session = Session {
        id: Uuid::new_v4().to_string(),
        lc_id: request.lc_id,
        problem,
        full_transcript: String::new(),
        status: SessionStatus::Active,
        created_at: now,
        updated_at: now,
    };

    db::sessions::insert_session(&state.db, &session).await?;

    tracing::info!(
        session_id = %session.id,
        lc_id = ?session.lc_id,
        resolved = session.problem.is_some(),
        "session created"
    );

    Ok(Json(CreateSessionResponse {
        session_id: session.id,
        problem: session.problem,
        needs_manual_input,
        created_at: session.created_at,
    }))
}

/// GET /sessions/{session_id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let session = db::sessions::get_session(&state.db, &session_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Session not found: {}", session_id)))?;

    let checkpoint_count = db::checkpoints::count_for_session(&state.db, &session_id).await?;
    let analysis_count = db::analyses::count_for_session(&state.db, &session_id).await?;

    Ok(Json(json!({
        "session_id": session.id,
        "problem": session.problem,
        "status": session.status,
        "full_transcript": session.full_transcript,
        "checkpoint_count": checkpoint_count,
        "analysis_count": analysis_count,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SetProblemRequest {
    pub lc_id: Option<String>,
    pub problem_text: Option<String>,
}

/// PATCH /sessions/{session_id}/problem
///
/// Re-resolves the session's problem. A miss leaves the stored problem
/// untouched and reports that manual input is still needed.
pub async fn set_problem(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<SetProblemRequest>,
) -> ApiResult<Json<Value>> {
    db::sessions::get_session(&state.db, &session_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Session not found: {}", session_id)))?;

    let problem = state
        .resolver
        .resolve(request.lc_id.as_deref(), request.problem_text.as_deref())
        .await;

    match problem {
        Some(problem) => {
            db::sessions::update_problem(&state.db, &session_id, request.lc_id.as_deref(), &problem)
                .await?;
            Ok(Json(json!({"problem": problem, "needs_manual_input": false})))
        }
        None => Ok(Json(json!({"problem": null, "needs_manual_input": true}))),
    }
}

#[derive(Debug, Serialize)]
pub struct CompleteSessionResponse {
    pub session_id: String,
    pub mental_model_card_id: String,
}

/// POST /sessions/{session_id}/complete
///
/// Marks the session completed and distills its analyses into a mental
/// model card. Completing again regenerates the card.
pub async fn complete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<CompleteSessionResponse>> {
    let session = db::sessions::get_session(&state.db, &session_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Session not found: {}", session_id)))?;

    db::sessions::mark_completed(&state.db, &session_id).await?;

    let analyses = db::analyses::list_for_session(&state.db, &session_id).await?;

    let evolution: Vec<ApproachStep> = analyses
        .iter()
        .map(|a| ApproachStep {
            checkpoint_id: a.checkpoint_id.clone(),
            pattern: a.inferred_pattern.clone(),
            confidence: a.confidence,
        })
        .collect();

    let last = analyses.last();
    let card = MentalModelCard {
        id: Uuid::new_v4().to_string(),
        session_id: session_id.clone(),
        final_pattern: last.map(|a| a.inferred_pattern.clone()).unwrap_or_default(),
        key_invariants: last.map(|a| a.missing_pieces.clone()).unwrap_or_default(),
        approach_evolution: evolution,
        unanswered_questions: last.map(|a| a.questions.clone()).unwrap_or_default(),
        full_transcript: session.full_transcript,
        created_at: Utc::now(),
    };

    db::cards::upsert_card(&state.db, &card).await?;

    tracing::info!(session_id = %session_id, card_id = %card.id, "session completed");

    Ok(Json(CompleteSessionResponse {
        session_id,
        mental_model_card_id: card.id,
    }))
}

/// GET /sessions/{session_id}/card
pub async fn get_card(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<MentalModelCard>> {
    let card = db::cards::get_card(&state.db, &session_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Card not found for session: {}", session_id)))?;

    Ok(Json(card))
}
