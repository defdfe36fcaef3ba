//! Coaching turn API handler

use axum::{
    extract::{Multipart, Path, State},
    Json,
};

use s2s_common::models::CoachResponse;

use crate::error::{ApiError, ApiResult};
use crate::services::coach;
use crate::AppState;

/// POST /sessions/{session_id}/coach (multipart form)
pub async fn trigger_coach(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<Json<CoachResponse>> {
    let mut trigger_type: Option<String> = None;
    let mut reveal_mode = false;
    let mut audio_bytes: Option<Vec<u8>> = None;
    let mut png_bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "trigger_type" => {
                trigger_type = Some(field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Malformed multipart field: {}", e))
                })?);
            }
            "reveal_mode" => {
                let raw = field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Malformed multipart field: {}", e))
                })?;
                reveal_mode = matches!(raw.trim(), "true" | "True" | "1");
            }
            "audio_blob" => {
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read audio upload: {}", e))
                })?;
                if !bytes.is_empty() {
                    audio_bytes = Some(bytes.to_vec());
                }
            }
            "whiteboard_png" => {
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read image upload: {}", e))
                })?;
                if !bytes.is_empty() {
                    png_bytes = Some(bytes.to_vec());
                }
            }
            _ => {}
        }
    }

    let trigger_type = trigger_type
        .ok_or_else(|| ApiError::BadRequest("Missing field: trigger_type".to_string()))?;

    let response = coach::run_coach(
        &state,
        &session_id,
        &trigger_type,
        audio_bytes,
        png_bytes,
        reveal_mode,
    )
    .await?;

    Ok(Json(response))
}
