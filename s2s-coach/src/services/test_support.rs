//! Shared fakes and state builders for service tests

use std::sync::Arc;

use async_trait::async_trait;

use s2s_common::events::SessionChannel;
use s2s_common::{Error, Result};

use crate::config::CoachConfig;
use crate::services::problems::ProblemResolver;
use crate::services::storage::BlobStorage;
use crate::services::{Reasoner, SpeechSynthesizer, Transcriber};
use crate::AppState;

pub struct FixedReasoner(pub String);

#[async_trait]
impl Reasoner for FixedReasoner {
    async fn reason(&self, _system: &str, _user: &str, _image: Option<&[u8]>) -> Result<String> {
        Ok(self.0.clone())
    }
}

pub struct FailingReasoner;

#[async_trait]
impl Reasoner for FailingReasoner {
    async fn reason(&self, _system: &str, _user: &str, _image: Option<&[u8]>) -> Result<String> {
        Err(Error::Upstream("reasoner offline".to_string()))
    }
}

pub struct FixedTranscriber(pub String);

#[async_trait]
impl Transcriber for FixedTranscriber {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String> {
        Ok(self.0.clone())
    }
}

pub struct FailingTranscriber;

#[async_trait]
impl Transcriber for FailingTranscriber {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String> {
        Err(Error::Upstream("transcriber offline".to_string()))
    }
}

pub struct NoSynthesizer;

#[async_trait]
impl SpeechSynthesizer for NoSynthesizer {
    async fn synthesize(&self, _text: &str) -> Option<Vec<u8>> {
        None
    }
}

pub struct FixedSynthesizer(pub Vec<u8>);

#[async_trait]
impl SpeechSynthesizer for FixedSynthesizer {
    async fn synthesize(&self, _text: &str) -> Option<Vec<u8>> {
        Some(self.0.clone())
    }
}

/// Build an [`AppState`] over a fresh temp database with the given
/// reasoner, a failing transcriber, and synthesis disabled.
pub async fn state_with(reasoner: Arc<dyn Reasoner>) -> (tempfile::TempDir, AppState) {
    state_with_parts(reasoner, Arc::new(FailingTranscriber), Arc::new(NoSynthesizer)).await
}

/// Build an [`AppState`] over a fresh temp database with full control
/// over the capability fakes. Resolver endpoints are unroutable so no
/// test ever leaves the machine.
pub async fn state_with_parts(
    reasoner: Arc<dyn Reasoner>,
    transcriber: Arc<dyn Transcriber>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
) -> (tempfile::TempDir, AppState) {
    let dir = tempfile::tempdir().unwrap();
    let pool = crate::db::init_database_pool(&dir.path().join("test.db"))
        .await
        .unwrap();

    let mut config = CoachConfig::new("test-key".to_string(), dir.path().join("uploads"));
    config.leetcode_graphql_url = "http://127.0.0.1:1/graphql".to_string();
    config.problem_api_url = "http://127.0.0.1:1".to_string();
    let config = Arc::new(config);

    let channel = Arc::new(SessionChannel::new());
    let resolver = Arc::new(ProblemResolver::new(pool.clone(), &config));
    let storage = Arc::new(BlobStorage::new(config.upload_dir.clone()));

    let state = AppState::new(
        pool, channel, config, resolver, storage, transcriber, reasoner, synthesizer,
    );
    (dir, state)
}
