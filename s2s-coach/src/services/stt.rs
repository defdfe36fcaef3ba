//! Background audio transcription
//!
//! Runs detached from the checkpoint-creation request: the HTTP
//! response has already gone out by the time this completes. The task
//! owns its own pool/channel handles, never anything scoped to the
//! originating request. Every failure here is terminal for the task and
//! logged only; there is no caller left to report to.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use s2s_common::events::{SessionChannel, SessionEvent};
use s2s_common::Result;

use crate::db;
use crate::services::Transcriber;
use crate::AppState;

/// Spawn a detached transcription task for a freshly created checkpoint.
pub fn spawn_transcription(
    state: &AppState,
    audio: Vec<u8>,
    session_id: String,
    checkpoint_id: String,
) {
    let pool = state.db.clone();
    let channel = state.channel.clone();
    let transcriber = state.transcriber.clone();

    tokio::spawn(async move {
        if let Err(e) = transcribe_and_attach(
            &pool,
            &channel,
            transcriber.as_ref(),
            &audio,
            &session_id,
            &checkpoint_id,
        )
        .await
        {
            warn!(
                session_id = %session_id,
                checkpoint_id = %checkpoint_id,
                error = %e,
                "background transcription failed"
            );
        }
    });
}

/// Transcribe a checkpoint's audio and attach the result.
///
/// On non-empty output, the checkpoint's transcript fragment and the
/// session's cumulative transcript are committed together; the
/// `transcript_delta` event is published only after that commit.
pub async fn transcribe_and_attach(
    pool: &SqlitePool,
    channel: &SessionChannel,
    transcriber: &dyn Transcriber,
    audio: &[u8],
    session_id: &str,
    checkpoint_id: &str,
) -> Result<()> {
    let text = transcriber.transcribe(audio).await?;
    let delta = text.trim().to_string();
    if delta.is_empty() {
        debug!(checkpoint_id = %checkpoint_id, "transcription produced no text");
        return Ok(());
    }

    db::checkpoints::attach_transcript_delta(pool, session_id, checkpoint_id, &delta).await?;

    channel.publish(
        session_id,
        SessionEvent::TranscriptDelta {
            text: delta,
            timestamp: Utc::now(),
        },
    );

    Ok(())
}
