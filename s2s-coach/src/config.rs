//! Service configuration for s2s-coach
//!
//! One explicit config struct, built once at startup and passed by
//! `Arc` into every component that talks to the outside world. External
//! service clients never read the environment themselves.

use std::path::PathBuf;

/// Default ElevenLabs voice ("Rachel")
pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

/// LeetCode GraphQL endpoint (structured metadata tier)
pub const LEETCODE_GRAPHQL_URL: &str = "https://leetcode.com/graphql";

/// alfa-leetcode-api endpoint (unstructured metadata fallback tier)
pub const PROBLEM_API_URL: &str = "https://alfa-leetcode-api.onrender.com";

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct CoachConfig {
    /// OpenAI API key (reasoning + transcription)
    pub openai_api_key: String,
    /// ElevenLabs API key; `None` disables speech synthesis
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_voice_id: String,
    /// Root directory for stored audio/image blobs
    pub upload_dir: PathBuf,
    /// Structured metadata lookup endpoint
    pub leetcode_graphql_url: String,
    /// Unstructured metadata fallback endpoint
    pub problem_api_url: String,
}

impl CoachConfig {
    pub fn new(openai_api_key: String, upload_dir: PathBuf) -> Self {
        Self {
            openai_api_key,
            elevenlabs_api_key: None,
            elevenlabs_voice_id: DEFAULT_VOICE_ID.to_string(),
            upload_dir,
            leetcode_graphql_url: LEETCODE_GRAPHQL_URL.to_string(),
            problem_api_url: PROBLEM_API_URL.to_string(),
        }
    }
}
