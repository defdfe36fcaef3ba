//! Checkpoint ingestion API handler

use axum::{
    extract::{Multipart, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use s2s_common::events::SessionEvent;
use s2s_common::models::Checkpoint;

use crate::error::{ApiError, ApiResult};
use crate::services::stt;
use crate::{db, AppState};

#[derive(Debug, Serialize)]
pub struct CreateCheckpointResponse {
    pub checkpoint_id: String,
    pub audio_url: Option<String>,
    /// Always null here; the fragment arrives later as a
    /// `transcript_delta` event once background transcription commits.
    pub transcript_delta: Option<String>,
}

/// POST /checkpoints (multipart form)
///
/// Creates the checkpoint synchronously and responds immediately.
/// Supplied audio is stored, then transcribed by a detached task that
/// outlives this request.
pub async fn create_checkpoint(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<CreateCheckpointResponse>> {
    let mut session_id: Option<String> = None;
    let mut sequence_num: Option<i64> = None;
    let mut pseudocode = String::new();
    let mut whiteboard_json = "{}".to_string();
    let mut labels: Vec<Value> = Vec::new();
    let mut audio_bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "session_id" => session_id = Some(read_text(field).await?),
            "sequence_num" => {
                let raw = read_text(field).await?;
                sequence_num = Some(raw.trim().parse().map_err(|_| {
                    ApiError::BadRequest(format!("Invalid sequence_num: {}", raw))
                })?);
            }
            "pseudocode" => pseudocode = read_text(field).await?,
            "whiteboard_json" => whiteboard_json = read_text(field).await?,
            "labels" => {
                let raw = read_text(field).await?;
                labels = serde_json::from_str(&raw).unwrap_or_default();
            }
            "audio_blob" => {
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read audio upload: {}", e))
                })?;
                if !bytes.is_empty() {
                    audio_bytes = Some(bytes.to_vec());
                }
            }
            _ => {}
        }
    }

    let session_id =
        session_id.ok_or_else(|| ApiError::BadRequest("Missing field: session_id".to_string()))?;
    let sequence_num = sequence_num
        .ok_or_else(|| ApiError::BadRequest("Missing field: sequence_num".to_string()))?;

    let mut audio_url = None;
    if let Some(bytes) = &audio_bytes {
        let filename = format!("audio_{}.webm", sequence_num);
        audio_url = Some(state.storage.store(&session_id, &filename, bytes).await?);
    }

    let checkpoint = Checkpoint {
        id: Uuid::new_v4().to_string(),
        session_id: session_id.clone(),
        sequence_num,
        pseudocode,
        whiteboard_json,
        labels,
        audio_url: audio_url.clone(),
        transcript_delta: None,
        created_at: Utc::now(),
    };

    db::checkpoints::insert_checkpoint(&state.db, &checkpoint).await?;

    tracing::debug!(
        session_id = %session_id,
        checkpoint_id = %checkpoint.id,
        sequence_num,
        has_audio = audio_bytes.is_some(),
        "checkpoint created"
    );

    // Transcription runs detached; the response below does not wait on it
    if let Some(bytes) = audio_bytes {
        stt::spawn_transcription(&state, bytes, session_id.clone(), checkpoint.id.clone());
    }

    state.channel.publish(
        &session_id,
        SessionEvent::CheckpointSaved {
            checkpoint_id: checkpoint.id.clone(),
        },
    );

    Ok(Json(CreateCheckpointResponse {
        checkpoint_id: checkpoint.id,
        audio_url,
        transcript_delta: None,
    }))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> ApiResult<String> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart field: {}", e)))
}
