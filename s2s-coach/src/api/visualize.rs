//! Pseudocode visualization API handler

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::services::visualizer;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct VisualizeRequest {
    pub pseudocode: String,
    #[serde(default)]
    pub problem_title: String,
}

/// POST /visualize
pub async fn visualize(
    State(state): State<AppState>,
    Json(request): Json<VisualizeRequest>,
) -> Json<Value> {
    let shapes = visualizer::pseudocode_to_shapes(
        state.reasoner.as_ref(),
        &request.pseudocode,
        &request.problem_title,
    )
    .await;

    Json(json!({ "shapes": shapes }))
}
