//! s2s-coach library interface
//!
//! Backend for real-time sketch-and-speech coaching sessions: ingests
//! whiteboard checkpoints, orchestrates multi-modal analysis turns, and
//! pushes results back to the live client over per-session SSE.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod prompts;
pub mod services;

pub use crate::config::CoachConfig;
pub use crate::error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use s2s_common::events::SessionChannel;
use services::problems::ProblemResolver;
use services::storage::BlobStorage;
use services::{Reasoner, SpeechSynthesizer, Transcriber};

/// Uploaded audio/image payloads top out well below this
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Per-session event fan-out
    pub channel: Arc<SessionChannel>,
    /// Resolved service configuration
    pub config: Arc<CoachConfig>,
    /// Tiered problem metadata resolver
    pub resolver: Arc<ProblemResolver>,
    /// Blob storage for audio and snapshots
    pub storage: Arc<BlobStorage>,
    /// Speech-to-text capability
    pub transcriber: Arc<dyn Transcriber>,
    /// Multi-modal reasoning capability
    pub reasoner: Arc<dyn Reasoner>,
    /// Text-to-speech capability
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: SqlitePool,
        channel: Arc<SessionChannel>,
        config: Arc<CoachConfig>,
        resolver: Arc<ProblemResolver>,
        storage: Arc<BlobStorage>,
        transcriber: Arc<dyn Transcriber>,
        reasoner: Arc<dyn Reasoner>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            db,
            channel,
            config,
            resolver,
            storage,
            transcriber,
            reasoner,
            synthesizer,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let upload_dir = state.config.upload_dir.clone();

    Router::new()
        .route("/health", get(api::health::health))
        .route("/sessions", post(api::sessions::create_session))
        .route("/sessions/:session_id", get(api::sessions::get_session))
        .route(
            "/sessions/:session_id/problem",
            patch(api::sessions::set_problem),
        )
        .route(
            "/sessions/:session_id/complete",
            post(api::sessions::complete_session),
        )
        .route("/sessions/:session_id/card", get(api::sessions::get_card))
        .route("/sessions/:session_id/coach", post(api::coach::trigger_coach))
        .route(
            "/sessions/:session_id/events",
            get(api::events::session_event_stream),
        )
        .route("/checkpoints", post(api::checkpoints::create_checkpoint))
        .route("/verify", post(api::verify::verify))
        .route("/visualize", post(api::visualize::visualize))
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
