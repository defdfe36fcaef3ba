//! ElevenLabs speech synthesis client
//!
//! Converts micro-hints to speech. Synthesis is strictly optional: a
//! missing API key, network failure, or non-2xx response all yield
//! `None` and the coaching turn proceeds without audio.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::warn;

use super::SpeechSynthesizer;

const ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io/v1";
const ELEVENLABS_MODEL: &str = "eleven_flash_v2_5";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ElevenLabsClient {
    http: reqwest::Client,
    api_key: Option<String>,
    voice_id: String,
}

impl ElevenLabsClient {
    pub fn new(api_key: Option<String>, voice_id: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            api_key,
            voice_id,
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(&self, text: &str) -> Option<Vec<u8>> {
        let api_key = self.api_key.as_ref()?;
        if text.is_empty() {
            return None;
        }

        let url = format!("{}/text-to-speech/{}", ELEVENLABS_BASE_URL, self.voice_id);
        let body = json!({
            "text": text,
            "model_id": ELEVENLABS_MODEL,
            "voice_settings": {
                "stability": 0.5,
                "similarity_boost": 0.75,
            },
        });

        let response = self
            .http
            .post(&url)
            .header("xi-api-key", api_key)
            .header("Accept", "audio/mpeg")
            .json(&body)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => match resp.bytes().await {
                Ok(bytes) => Some(bytes.to_vec()),
                Err(e) => {
                    warn!(error = %e, "speech synthesis body read failed");
                    None
                }
            },
            Ok(resp) => {
                warn!(status = %resp.status(), "speech synthesis returned non-success");
                None
            }
            Err(e) => {
                warn!(error = %e, "speech synthesis request failed");
                None
            }
        }
    }
}
