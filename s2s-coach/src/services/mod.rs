//! External capabilities and orchestration services
//!
//! The three external AI capabilities sit behind traits so the
//! orchestration pipeline and background transcription can be exercised
//! with substitutable fakes. Live implementations are in
//! [`openai`] and [`tts`].

pub mod coach;
pub mod openai;
pub mod problems;
pub mod slug_table;
pub mod storage;
pub mod stt;
pub mod tts;
pub mod verifier;
pub mod visualizer;

#[cfg(test)]
pub mod test_support;

use async_trait::async_trait;
use s2s_common::Result;

/// Speech-to-text capability
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio clip. Any transport or format failure is an
    /// error; the caller decides whether it degrades or aborts.
    async fn transcribe(&self, audio: &[u8]) -> Result<String>;
}

/// Multi-modal reasoning capability.
///
/// Returns the raw structured (JSON) response body; callers parse it
/// into their own reply shapes and treat malformed output as failure.
#[async_trait]
pub trait Reasoner: Send + Sync {
    async fn reason(
        &self,
        system_prompt: &str,
        user_text: &str,
        image_png: Option<&[u8]>,
    ) -> Result<String>;
}

/// Text-to-speech capability.
///
/// Absence (feature disabled, upstream failure) is a normal outcome,
/// not an error.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Option<Vec<u8>>;
}
