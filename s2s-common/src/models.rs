//! Persisted data model for coaching sessions
//!
//! One `Session` owns an ordered series of `Checkpoint` snapshots and the
//! `Analysis` records produced by coaching turns. All structs serialize to
//! the wire shapes the frontend consumes; database mapping is done by hand
//! in the service crate's `db` module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Problem metadata in the common normalized shape.
///
/// Every resolution tier (structured lookup, unstructured lookup, cache,
/// freeform text) funnels into this struct. All fields default so records
/// cached before the schema settled still deserialize.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProblemMeta {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub constraints: Vec<String>,
    /// Examples may be plain strings or `{input, output}` objects.
    #[serde(default)]
    pub examples: Vec<Value>,
    #[serde(rename = "topicTags", default)]
    pub topic_tags: Vec<String>,
}

/// Session lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => SessionStatus::Completed,
            _ => SessionStatus::Active,
        }
    }
}

/// One end-to-end coaching interaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    /// External problem reference (problem number as entered by the user)
    pub lc_id: Option<String>,
    pub problem: Option<ProblemMeta>,
    /// Cumulative spoken transcript, newline-joined, append-only
    pub full_transcript: String,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One snapshot of user work within a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: String,
    pub session_id: String,
    /// Caller-supplied ordering; uniqueness is not enforced
    pub sequence_num: i64,
    pub pseudocode: String,
    pub whiteboard_json: String,
    /// Labels may be plain strings or `{label}` objects
    pub labels: Vec<Value>,
    pub audio_url: Option<String>,
    /// Filled in asynchronously after creation, at most once per task run
    pub transcript_delta: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Immutable record of one coaching turn's computed result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub id: String,
    pub session_id: String,
    /// Most recent checkpoint at trigger time, if any
    pub checkpoint_id: Option<String>,
    pub trigger_type: String,
    pub inferred_pattern: String,
    pub confidence: f64,
    pub evidence: String,
    pub visual_description: String,
    pub snapshot_url: Option<String>,
    pub missing_pieces: Vec<String>,
    pub questions: Vec<String>,
    pub micro_hint: String,
    pub reveal_outline: Option<String>,
    /// Raw upstream response, kept for audit
    pub raw_llm_response: String,
    pub created_at: DateTime<Utc>,
}

/// Inferred algorithm approach, as reported by the reasoning service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InferredApproach {
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub evidence: String,
}

/// Wire shape of one coaching turn result, returned to the HTTP caller
/// and pushed over the session event channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachResponse {
    /// Absent when the turn never reached persistence (unknown session)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<String>,
    pub inferred_approach: InferredApproach,
    pub visual_description: String,
    pub generated_pseudocode: String,
    pub missing_pieces: Vec<String>,
    pub questions: Vec<String>,
    pub micro_hint: String,
    pub reveal_outline: Option<String>,
    pub hint_audio_url: Option<String>,
}

/// One step of a session's approach evolution, summarized on completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproachStep {
    pub checkpoint_id: Option<String>,
    pub pattern: String,
    pub confidence: f64,
}

/// Post-session summary card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentalModelCard {
    pub id: String,
    pub session_id: String,
    pub final_pattern: String,
    pub key_invariants: Vec<String>,
    pub approach_evolution: Vec<ApproachStep>,
    pub unanswered_questions: Vec<String>,
    pub full_transcript: String,
    pub created_at: DateTime<Utc>,
}
