//! s2s-coach - Coaching session backend
//!
//! Serves the sketch2solve coaching API: session lifecycle, checkpoint
//! ingestion with background transcription, coaching turn orchestration,
//! solution verification, and per-session SSE event delivery.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use s2s_coach::services::openai::OpenAiClient;
use s2s_coach::services::problems::ProblemResolver;
use s2s_coach::services::storage::BlobStorage;
use s2s_coach::services::tts::ElevenLabsClient;
use s2s_coach::{build_router, AppState, CoachConfig};

/// Command-line arguments for s2s-coach
#[derive(Parser, Debug)]
#[command(name = "s2s-coach")]
#[command(about = "Coaching session backend for sketch2solve")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8000", env = "S2S_PORT")]
    port: u16,

    /// SQLite database path
    #[arg(long, default_value = "sketch2solve.db", env = "S2S_DATABASE")]
    database: PathBuf,

    /// Directory for uploaded audio and snapshots
    #[arg(long, default_value = "uploads", env = "S2S_UPLOAD_DIR")]
    upload_dir: PathBuf,

    /// OpenAI API key (reasoning + transcription)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: String,

    /// ElevenLabs API key; omit to disable hint audio
    #[arg(long, env = "ELEVENLABS_API_KEY", hide_env_values = true)]
    elevenlabs_api_key: Option<String>,

    /// ElevenLabs voice id
    #[arg(long, env = "ELEVENLABS_VOICE_ID", default_value = s2s_coach::config::DEFAULT_VOICE_ID)]
    elevenlabs_voice_id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "s2s_coach=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting s2s-coach on port {}", args.port);
    info!("Database: {}", args.database.display());
    info!("Upload dir: {}", args.upload_dir.display());

    std::fs::create_dir_all(&args.upload_dir).context("Failed to create upload directory")?;

    let pool = s2s_coach::db::init_database_pool(&args.database)
        .await
        .context("Failed to initialize database")?;
    info!("Database connection established");

    let mut config = CoachConfig::new(args.openai_api_key, args.upload_dir);
    config.elevenlabs_api_key = args.elevenlabs_api_key;
    config.elevenlabs_voice_id = args.elevenlabs_voice_id;
    let config = Arc::new(config);

    let openai = Arc::new(
        OpenAiClient::new(config.openai_api_key.clone())
            .context("Failed to create OpenAI client")?,
    );
    let synthesizer = Arc::new(ElevenLabsClient::new(
        config.elevenlabs_api_key.clone(),
        config.elevenlabs_voice_id.clone(),
    ));
    if config.elevenlabs_api_key.is_none() {
        info!("Speech synthesis disabled (no ElevenLabs API key)");
    }

    let channel = Arc::new(s2s_common::events::SessionChannel::new());
    let resolver = Arc::new(ProblemResolver::new(pool.clone(), &config));
    let storage = Arc::new(BlobStorage::new(config.upload_dir.clone()));

    let state = AppState::new(
        pool,
        channel,
        config,
        resolver,
        storage,
        openai.clone(),
        openai,
        synthesizer,
    );

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
