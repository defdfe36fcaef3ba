//! OpenAI API client
//!
//! Provides both external AI capabilities that run against OpenAI:
//! chat-based multi-modal reasoning (forced JSON output) and Whisper
//! speech transcription.

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use s2s_common::{Error, Result};

use super::{Reasoner, Transcriber};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const CHAT_MODEL: &str = "gpt-4o";
const WHISPER_MODEL: &str = "whisper-1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Chat completion response (the slice of it we read)
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Whisper transcription response
#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// OpenAI API client
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Upstream(e.to_string()))?;

        Ok(Self {
            http,
            api_key,
            base_url: OPENAI_BASE_URL.to_string(),
        })
    }
}

#[async_trait]
impl Reasoner for OpenAiClient {
    async fn reason(
        &self,
        system_prompt: &str,
        user_text: &str,
        image_png: Option<&[u8]>,
    ) -> Result<String> {
        // Message content mirrors pasting text plus an image into a chat
        let mut user_content = vec![json!({"type": "text", "text": user_text})];
        if let Some(png) = image_png {
            let b64 = base64::engine::general_purpose::STANDARD.encode(png);
            user_content.push(json!({
                "type": "image_url",
                "image_url": {"url": format!("data:image/png;base64,{}", b64)},
            }));
        }

        let body = json!({
            "model": CHAT_MODEL,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_content},
            ],
            "response_format": {"type": "json_object"},
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("chat request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "chat returned {}: {}",
                status, text
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("chat response parse failed: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_else(|| "{}".to_string());

        tracing::debug!(bytes = content.len(), "reasoning response received");

        Ok(content)
    }
}

#[async_trait]
impl Transcriber for OpenAiClient {
    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        let part = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name("audio.webm")
            .mime_str("audio/webm")
            .map_err(|e| Error::Upstream(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .text("model", WHISPER_MODEL)
            .part("file", part);

        let response = self
            .http
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("transcription request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "transcription returned {}: {}",
                status, text
            )));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("transcription parse failed: {}", e)))?;

        Ok(parsed.text)
    }
}
