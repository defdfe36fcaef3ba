//! Coaching turn orchestration
//!
//! One call assembles multi-modal context from persisted session state,
//! invokes the reasoning service, persists the resulting analysis, and
//! kicks off the optional hint audio, then pushes the result over the
//! session channel. Only two conditions surface to the caller as
//! anything but a well-formed result: an unknown session (static
//! fallback result, nothing persisted) and a failed analysis write
//! (error, because the analysis history is authoritative).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use s2s_common::events::SessionEvent;
use s2s_common::models::{Analysis, CoachResponse, InferredApproach};
use s2s_common::Result;

use crate::db;
use crate::prompts;
use crate::AppState;

/// Audio clips at or below this size are treated as empty/corrupt and
/// skipped rather than sent for transcription.
const MIN_AUDIO_BYTES: usize = 1000;

/// Evidence string used whenever the reasoning service is unavailable
pub const FALLBACK_EVIDENCE: &str = "Analysis unavailable";

/// Structured reply expected from the reasoning service.
///
/// Every field defaults so a sparse-but-valid JSON reply still parses;
/// a reply that is not valid JSON at all falls back wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachReply {
    #[serde(default)]
    pub inferred_approach: InferredApproach,
    #[serde(default)]
    pub missing_pieces: Vec<String>,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub micro_hint: String,
    #[serde(default)]
    pub reveal_outline: Option<String>,
    #[serde(default)]
    pub generated_pseudocode: String,
}

impl CoachReply {
    /// Static reply substituted when reasoning fails or the session is
    /// unknown.
    pub fn fallback() -> Self {
        Self {
            inferred_approach: InferredApproach {
                pattern: "Unknown".to_string(),
                confidence: 0.0,
                evidence: FALLBACK_EVIDENCE.to_string(),
            },
            missing_pieces: vec!["Unable to analyze at this time".to_string()],
            questions: vec!["Can you describe your current approach in words?".to_string()],
            micro_hint: "Try restating the problem constraints aloud.".to_string(),
            reveal_outline: None,
            generated_pseudocode: String::new(),
        }
    }
}

fn response_from_reply(reply: &CoachReply, analysis_id: Option<String>) -> CoachResponse {
    CoachResponse {
        analysis_id,
        inferred_approach: reply.inferred_approach.clone(),
        visual_description: reply.inferred_approach.evidence.clone(),
        generated_pseudocode: reply.generated_pseudocode.clone(),
        missing_pieces: reply.missing_pieces.clone(),
        questions: reply.questions.clone(),
        micro_hint: reply.micro_hint.clone(),
        reveal_outline: reply.reveal_outline.clone(),
        hint_audio_url: None,
    }
}

/// Run one coaching turn for a session.
pub async fn run_coach(
    state: &AppState,
    session_id: &str,
    trigger_type: &str,
    audio: Option<Vec<u8>>,
    png: Option<Vec<u8>>,
    reveal_mode: bool,
) -> Result<CoachResponse> {
    let Some(session) = db::sessions::get_session(&state.db, session_id).await? else {
        return Ok(response_from_reply(&CoachReply::fallback(), None));
    };

    let analysis_id = Uuid::new_v4().to_string();

    // Snapshot persistence is best-effort; a turn without an image
    // reference is still a complete turn.
    let mut snapshot_url = None;
    if let Some(png) = &png {
        let filename = format!("snap_{}.png", analysis_id);
        match state.storage.store(session_id, &filename, png).await {
            Ok(url) => snapshot_url = Some(url),
            Err(e) => warn!(session_id = %session_id, error = %e, "snapshot store failed"),
        }
    }

    let latest_cp = db::checkpoints::latest_checkpoint(&state.db, session_id).await?;

    let pseudocode = latest_cp
        .as_ref()
        .map(|cp| cp.pseudocode.clone())
        .unwrap_or_default();
    let labels = latest_cp
        .as_ref()
        .map(|cp| cp.labels.clone())
        .unwrap_or_default();
    let problem = session.problem.clone().unwrap_or_default();

    let mut text_context = prompts::build_text_context(
        &problem,
        &pseudocode,
        &labels,
        &session.full_transcript,
        trigger_type,
        reveal_mode,
    );

    // Inline transcription of the turn's audio is non-fatal; the turn
    // proceeds without it.
    if let Some(audio) = audio.as_ref().filter(|a| a.len() > MIN_AUDIO_BYTES) {
        match state.transcriber.transcribe(audio).await {
            Ok(text) if !text.is_empty() => {
                text_context.push_str(&format!("\n\nUser just said: {}", text));
            }
            Ok(_) => {}
            Err(e) => warn!(session_id = %session_id, error = %e, "turn transcription failed"),
        }
    }

    let (mut reply, raw) = match state
        .reasoner
        .reason(prompts::COACH_SYSTEM_PROMPT, &text_context, png.as_deref())
        .await
    {
        Ok(raw) => match serde_json::from_str::<CoachReply>(&raw) {
            Ok(reply) => (reply, raw),
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "malformed reasoning reply");
                fallback_with_raw()
            }
        },
        Err(e) => {
            warn!(session_id = %session_id, error = %e, "reasoning call failed");
            fallback_with_raw()
        }
    };

    // The outline is only ever revealed on request
    if !reveal_mode {
        reply.reveal_outline = None;
    }

    let analysis = Analysis {
        id: analysis_id.clone(),
        session_id: session_id.to_string(),
        checkpoint_id: latest_cp.as_ref().map(|cp| cp.id.clone()),
        trigger_type: trigger_type.to_string(),
        inferred_pattern: reply.inferred_approach.pattern.clone(),
        confidence: reply.inferred_approach.confidence,
        evidence: reply.inferred_approach.evidence.clone(),
        visual_description: reply.inferred_approach.evidence.clone(),
        snapshot_url,
        missing_pieces: reply.missing_pieces.clone(),
        questions: reply.questions.clone(),
        micro_hint: reply.micro_hint.clone(),
        reveal_outline: reply.reveal_outline.clone(),
        raw_llm_response: raw,
        created_at: Utc::now(),
    };

    // Authoritative history: this is the one write that fails the turn
    db::analyses::insert_analysis(&state.db, &analysis).await?;

    let mut response = response_from_reply(&reply, Some(analysis_id.clone()));

    if !reply.micro_hint.is_empty() {
        if let Some(bytes) = state.synthesizer.synthesize(&reply.micro_hint).await {
            let filename = format!("hint_{}.mp3", analysis_id);
            match state.storage.store(session_id, &filename, &bytes).await {
                Ok(url) => response.hint_audio_url = Some(url),
                Err(e) => warn!(session_id = %session_id, error = %e, "hint audio store failed"),
            }
        }
    }

    state.channel.publish(
        session_id,
        SessionEvent::CoachResponse {
            analysis: response.clone(),
        },
    );

    Ok(response)
}

fn fallback_with_raw() -> (CoachReply, String) {
    let reply = CoachReply::fallback();
    let raw = serde_json::to_string(&reply).unwrap_or_else(|_| "{}".to_string());
    (reply, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{
        state_with, state_with_parts, FailingReasoner, FailingTranscriber, FixedReasoner,
        FixedSynthesizer,
    };
    use s2s_common::models::{Checkpoint, Session, SessionStatus};
    use std::sync::Arc;

    async fn seed_session(state: &AppState, id: &str) {
        let now = Utc::now();
        let session = Session {
            id: id.to_string(),
            lc_id: Some("1".to_string()),
            problem: None,
            full_transcript: String::new(),
            status: SessionStatus::Active,
            created_at: now,
            updated_at: now,
        };
        db::sessions::insert_session(&state.db, &session).await.unwrap();
    }

    async fn seed_checkpoint(state: &AppState, session_id: &str, id: &str, seq: i64) {
        let cp = Checkpoint {
            id: id.to_string(),
            session_id: session_id.to_string(),
            sequence_num: seq,
            pseudocode: "for i in arr: ...".to_string(),
            whiteboard_json: "{}".to_string(),
            labels: Vec::new(),
            audio_url: None,
            transcript_delta: None,
            created_at: Utc::now(),
        };
        db::checkpoints::insert_checkpoint(&state.db, &cp).await.unwrap();
    }

    fn good_reply_json() -> String {
        serde_json::json!({
            "inferred_approach": {
                "pattern": "Two Pointers",
                "confidence": 0.8,
                "evidence": "Array with two markers drawn",
            },
            "missing_pieces": ["termination condition"],
            "questions": ["When do the pointers cross?"],
            "micro_hint": "Watch the pointer crossing case.",
            "reveal_outline": "full outline here",
            "generated_pseudocode": "l, r = 0, n-1",
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_unknown_session_returns_fallback_without_side_effects() {
        let (_dir, state) = state_with(Arc::new(FixedReasoner(good_reply_json()))).await;
        let mut sub = state.channel.clone().register("ghost");

        let result = run_coach(&state, "ghost", "manual", None, None, false)
            .await
            .unwrap();

        assert!(result.analysis_id.is_none());
        assert_eq!(result.inferred_approach.pattern, "Unknown");
        assert_eq!(result.inferred_approach.confidence, 0.0);
        assert!(!result.questions.is_empty());

        // No analysis row, no event
        assert_eq!(
            db::analyses::count_for_session(&state.db, "ghost").await.unwrap(),
            0
        );
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_reasoning_failure_still_persists_fallback_analysis() {
        let (_dir, state) = state_with(Arc::new(FailingReasoner)).await;
        seed_session(&state, "s1").await;
        seed_checkpoint(&state, "s1", "cp1", 1).await;

        let result = run_coach(&state, "s1", "manual", None, None, false)
            .await
            .unwrap();

        assert_eq!(result.inferred_approach.pattern, "Unknown");
        assert_eq!(result.inferred_approach.confidence, 0.0);
        assert!(!result.questions.is_empty());

        let analyses = db::analyses::list_for_session(&state.db, "s1").await.unwrap();
        assert_eq!(analyses.len(), 1);
        assert_eq!(analyses[0].evidence, FALLBACK_EVIDENCE);
        assert_eq!(analyses[0].inferred_pattern, "Unknown");
        assert_eq!(analyses[0].checkpoint_id.as_deref(), Some("cp1"));
    }

    #[tokio::test]
    async fn test_successful_turn_persists_and_publishes() {
        let (_dir, state) = state_with(Arc::new(FixedReasoner(good_reply_json()))).await;
        seed_session(&state, "s1").await;
        seed_checkpoint(&state, "s1", "cp1", 1).await;
        seed_checkpoint(&state, "s1", "cp2", 2).await;

        let mut sub = state.channel.clone().register("s1");

        let result = run_coach(&state, "s1", "manual", None, None, false)
            .await
            .unwrap();

        let analysis_id = result.analysis_id.clone().unwrap();
        assert_eq!(result.inferred_approach.pattern, "Two Pointers");
        // Reveal mode off: outline forced to null even if the model sent one
        assert!(result.reveal_outline.is_none());

        let analyses = db::analyses::list_for_session(&state.db, "s1").await.unwrap();
        assert_eq!(analyses.len(), 1);
        assert_eq!(analyses[0].id, analysis_id);
        // Links the most recent checkpoint
        assert_eq!(analyses[0].checkpoint_id.as_deref(), Some("cp2"));
        assert!(analyses[0].reveal_outline.is_none());

        match sub.recv().await.unwrap() {
            SessionEvent::CoachResponse { analysis } => {
                assert_eq!(analysis.analysis_id.as_deref(), Some(analysis_id.as_str()));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reveal_mode_keeps_outline() {
        let (_dir, state) = state_with(Arc::new(FixedReasoner(good_reply_json()))).await;
        seed_session(&state, "s1").await;

        let result = run_coach(&state, "s1", "reveal", None, None, true)
            .await
            .unwrap();

        assert_eq!(result.reveal_outline.as_deref(), Some("full outline here"));
    }

    #[tokio::test]
    async fn test_hint_audio_stored_when_synthesis_available() {
        let (_dir, state) = state_with_parts(
            Arc::new(FixedReasoner(good_reply_json())),
            Arc::new(FailingTranscriber),
            Arc::new(FixedSynthesizer(vec![0x49, 0x44, 0x33])),
        )
        .await;
        seed_session(&state, "s1").await;

        let result = run_coach(&state, "s1", "manual", None, Some(vec![0u8; 64]), false)
            .await
            .unwrap();

        let url = result.hint_audio_url.expect("hint audio stored");
        assert!(url.starts_with("/uploads/s1/hint_"));
        assert!(url.ends_with(".mp3"));

        // The whiteboard snapshot was stored and linked too
        let analyses = db::analyses::list_for_session(&state.db, "s1").await.unwrap();
        let snapshot = analyses[0].snapshot_url.as_deref().unwrap();
        assert!(snapshot.starts_with("/uploads/s1/snap_"));
    }

    #[tokio::test]
    async fn test_short_audio_is_ignored() {
        let (_dir, state) = state_with(Arc::new(FixedReasoner(good_reply_json()))).await;
        seed_session(&state, "s1").await;

        // Below the minimum size: transcriber must not be consulted.
        // The failing transcriber in the default test state would have
        // logged, but more importantly the turn still succeeds.
        let result = run_coach(&state, "s1", "manual", Some(vec![0u8; 10]), None, false)
            .await
            .unwrap();

        assert!(result.analysis_id.is_some());
    }
}
