//! Integration tests for the s2s-coach API
//!
//! Drives the full axum router over an isolated temp database with fake
//! AI capabilities, so no test leaves the machine. Covers the
//! end-to-end flows: session creation with freeform problem text,
//! checkpoint ingestion with detached transcription, coaching turns
//! (success and fallback), and verification.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::util::ServiceExt; // for `oneshot`

use s2s_coach::services::problems::ProblemResolver;
use s2s_coach::services::storage::BlobStorage;
use s2s_coach::services::{Reasoner, SpeechSynthesizer, Transcriber};
use s2s_coach::{build_router, AppState, CoachConfig};
use s2s_common::events::SessionChannel;
use s2s_common::{Error, Result};

const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

// =============================================================================
// Fakes and fixtures
// =============================================================================

struct FixedReasoner(String);

#[async_trait]
impl Reasoner for FixedReasoner {
    async fn reason(&self, _system: &str, _user: &str, _image: Option<&[u8]>) -> Result<String> {
        Ok(self.0.clone())
    }
}

struct FailingReasoner;

#[async_trait]
impl Reasoner for FailingReasoner {
    async fn reason(&self, _system: &str, _user: &str, _image: Option<&[u8]>) -> Result<String> {
        Err(Error::Upstream("reasoner offline".to_string()))
    }
}

struct FixedTranscriber(String);

#[async_trait]
impl Transcriber for FixedTranscriber {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String> {
        Ok(self.0.clone())
    }
}

struct NoSynthesizer;

#[async_trait]
impl SpeechSynthesizer for NoSynthesizer {
    async fn synthesize(&self, _text: &str) -> Option<Vec<u8>> {
        None
    }
}

struct TestApp {
    _dir: tempfile::TempDir,
    db: SqlitePool,
    app: Router,
}

async fn setup_app(reasoner: Arc<dyn Reasoner>) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let db = s2s_coach::db::init_database_pool(&dir.path().join("test.db"))
        .await
        .expect("Should initialize test database");

    let mut config = CoachConfig::new("test-key".to_string(), dir.path().join("uploads"));
    // Unroutable endpoints so metadata tiers fail fast if ever reached
    config.leetcode_graphql_url = "http://127.0.0.1:1/graphql".to_string();
    config.problem_api_url = "http://127.0.0.1:1".to_string();
    let config = Arc::new(config);

    let channel = Arc::new(SessionChannel::new());
    let resolver = Arc::new(ProblemResolver::new(db.clone(), &config));
    let storage = Arc::new(BlobStorage::new(config.upload_dir.clone()));

    let state = AppState::new(
        db.clone(),
        channel,
        config,
        resolver,
        storage,
        Arc::new(FixedTranscriber("I am thinking out loud".to_string())),
        reasoner,
        Arc::new(NoSynthesizer),
    );

    TestApp {
        _dir: dir,
        db,
        app: build_router(state),
    }
}

fn good_coach_reply() -> String {
    json!({
        "inferred_approach": {
            "pattern": "Hash Map",
            "confidence": 0.9,
            "evidence": "Boxes with key-value pairs",
        },
        "missing_pieces": ["collision handling"],
        "questions": ["What do you store as the key?"],
        "micro_hint": "Think about what lookup you repeat.",
        "reveal_outline": "outline",
        "generated_pseudocode": "seen = {}",
    })
    .to_string()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Hand-rolled multipart body: text fields plus optional file parts
fn multipart_request(uri: &str, fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    for (name, filename, bytes) in files {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                name, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn create_freeform_session(test: &TestApp, text: &str) -> String {
    let response = test
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/sessions",
            json!({"problem_text": text}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    body["session_id"].as_str().unwrap().to_string()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let test = setup_app(Arc::new(FailingReasoner)).await;

    let response = test.app.clone().oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "s2s-coach");
    assert!(body["version"].is_string());
}

// =============================================================================
// Sessions
// =============================================================================

#[tokio::test]
async fn test_create_session_with_freeform_text() {
    let test = setup_app(Arc::new(FailingReasoner)).await;

    let response = test
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/sessions",
            json!({"problem_text": "Count the islands in a grid."}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["needs_manual_input"], false);
    assert_eq!(body["problem"]["title"], "Custom Problem");
    // Freeform text is wrapped verbatim, no external resolution
    assert_eq!(body["problem"]["description"], "Count the islands in a grid.");
}

#[tokio::test]
async fn test_create_session_without_problem_reports_manual_input() {
    let test = setup_app(Arc::new(FailingReasoner)).await;

    let response = test
        .app
        .clone()
        .oneshot(json_request("POST", "/sessions", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["needs_manual_input"], true);
    assert!(body["problem"].is_null());
}

#[tokio::test]
async fn test_get_session_roundtrip_and_counts() {
    let test = setup_app(Arc::new(FailingReasoner)).await;
    let session_id = create_freeform_session(&test, "Reverse a linked list.").await;

    let response = test
        .app
        .clone()
        .oneshot(get_request(&format!("/sessions/{}", session_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["session_id"], session_id.as_str());
    assert_eq!(body["status"], "active");
    assert_eq!(body["checkpoint_count"], 0);
    assert_eq!(body["analysis_count"], 0);
}

#[tokio::test]
async fn test_get_unknown_session_is_404() {
    let test = setup_app(Arc::new(FailingReasoner)).await;

    let response = test
        .app
        .clone()
        .oneshot(get_request("/sessions/does-not-exist"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

// =============================================================================
// Checkpoints + background transcription
// =============================================================================

#[tokio::test]
async fn test_create_checkpoint_without_audio() {
    let test = setup_app(Arc::new(FailingReasoner)).await;
    let session_id = create_freeform_session(&test, "Two sum.").await;

    let response = test
        .app
        .clone()
        .oneshot(multipart_request(
            "/checkpoints",
            &[
                ("session_id", session_id.as_str()),
                ("sequence_num", "1"),
                ("pseudocode", "for i in arr: ..."),
                ("whiteboard_json", "{}"),
                ("labels", r#"[{"label": "i"}]"#),
            ],
            &[],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert!(body["checkpoint_id"].is_string());
    assert!(body["audio_url"].is_null());
    assert!(body["transcript_delta"].is_null());
}

#[tokio::test]
async fn test_checkpoint_audio_transcribes_in_background() {
    let test = setup_app(Arc::new(FailingReasoner)).await;
    let session_id = create_freeform_session(&test, "Two sum.").await;

    let audio = vec![1u8; 2048];
    let response = test
        .app
        .clone()
        .oneshot(multipart_request(
            "/checkpoints",
            &[(
                "session_id",
                session_id.as_str(),
            ), ("sequence_num", "1")],
            &[("audio_blob", "chunk.webm", &audio[..])],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    // Response returns before transcription completes
    assert!(body["transcript_delta"].is_null());
    assert_eq!(
        body["audio_url"],
        format!("/uploads/{}/audio_1.webm", session_id)
    );

    // The detached task commits the fragment shortly after
    let mut transcript = String::new();
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let row: (String,) = sqlx::query_as("SELECT full_transcript FROM sessions WHERE id = ?")
            .bind(&session_id)
            .fetch_one(&test.db)
            .await
            .unwrap();
        if !row.0.is_empty() {
            transcript = row.0;
            break;
        }
    }
    assert_eq!(transcript, "I am thinking out loud");

    let delta: (Option<String>,) =
        sqlx::query_as("SELECT transcript_delta FROM checkpoints WHERE session_id = ?")
            .bind(&session_id)
            .fetch_one(&test.db)
            .await
            .unwrap();
    assert_eq!(delta.0.as_deref(), Some("I am thinking out loud"));
}

#[tokio::test]
async fn test_checkpoint_missing_session_id_is_400() {
    let test = setup_app(Arc::new(FailingReasoner)).await;

    let response = test
        .app
        .clone()
        .oneshot(multipart_request("/checkpoints", &[("sequence_num", "1")], &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Coaching turns
// =============================================================================

#[tokio::test]
async fn test_coach_turn_end_to_end() {
    let test = setup_app(Arc::new(FixedReasoner(good_coach_reply()))).await;
    let session_id = create_freeform_session(&test, "Two sum.").await;

    // One checkpoint so the analysis links it
    let response = test
        .app
        .clone()
        .oneshot(multipart_request(
            "/checkpoints",
            &[
                ("session_id", session_id.as_str()),
                ("sequence_num", "1"),
                ("pseudocode", "for i in arr: ..."),
            ],
            &[],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = test
        .app
        .clone()
        .oneshot(multipart_request(
            &format!("/sessions/{}/coach", session_id),
            &[("trigger_type", "manual"), ("reveal_mode", "false")],
            &[],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["inferred_approach"]["pattern"], "Hash Map");
    assert!(body["analysis_id"].is_string());
    // Reveal mode off: outline suppressed even though the model sent one
    assert!(body["reveal_outline"].is_null());

    let session = test
        .app
        .clone()
        .oneshot(get_request(&format!("/sessions/{}", session_id)))
        .await
        .unwrap();
    let session_body = extract_json(session.into_body()).await;
    assert_eq!(session_body["analysis_count"], 1);
}

#[tokio::test]
async fn test_coach_turn_unknown_session_returns_fallback() {
    let test = setup_app(Arc::new(FixedReasoner(good_coach_reply()))).await;

    let response = test
        .app
        .clone()
        .oneshot(multipart_request(
            "/sessions/no-such-session/coach",
            &[("trigger_type", "manual")],
            &[],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["inferred_approach"]["pattern"], "Unknown");
    assert_eq!(body["inferred_approach"]["confidence"], 0.0);
    assert!(body.get("analysis_id").is_none());

    // Nothing was persisted
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM analyses")
        .fetch_one(&test.db)
        .await
        .unwrap();
    assert_eq!(count.0, 0);
}

#[tokio::test]
async fn test_coach_turn_reasoning_failure_still_records_analysis() {
    let test = setup_app(Arc::new(FailingReasoner)).await;
    let session_id = create_freeform_session(&test, "Two sum.").await;

    let response = test
        .app
        .clone()
        .oneshot(multipart_request(
            &format!("/sessions/{}/coach", session_id),
            &[("trigger_type", "manual")],
            &[],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["inferred_approach"]["pattern"], "Unknown");
    assert_eq!(body["inferred_approach"]["evidence"], "Analysis unavailable");
    assert!(!body["questions"].as_array().unwrap().is_empty());

    let row: (String, f64) =
        sqlx::query_as("SELECT evidence, confidence FROM analyses WHERE session_id = ?")
            .bind(&session_id)
            .fetch_one(&test.db)
            .await
            .unwrap();
    assert_eq!(row.0, "Analysis unavailable");
    assert_eq!(row.1, 0.0);
}

// =============================================================================
// Completion and card
// =============================================================================

#[tokio::test]
async fn test_complete_session_builds_card() {
    let test = setup_app(Arc::new(FixedReasoner(good_coach_reply()))).await;
    let session_id = create_freeform_session(&test, "Two sum.").await;

    let response = test
        .app
        .clone()
        .oneshot(multipart_request(
            &format!("/sessions/{}/coach", session_id),
            &[("trigger_type", "manual")],
            &[],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = test
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/sessions/{}/complete", session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert!(body["mental_model_card_id"].is_string());

    let card = test
        .app
        .clone()
        .oneshot(get_request(&format!("/sessions/{}/card", session_id)))
        .await
        .unwrap();
    assert_eq!(card.status(), StatusCode::OK);

    let card_body = extract_json(card.into_body()).await;
    assert_eq!(card_body["final_pattern"], "Hash Map");
    assert_eq!(card_body["approach_evolution"].as_array().unwrap().len(), 1);

    let session = test
        .app
        .clone()
        .oneshot(get_request(&format!("/sessions/{}", session_id)))
        .await
        .unwrap();
    let session_body = extract_json(session.into_body()).await;
    assert_eq!(session_body["status"], "completed");
}

// =============================================================================
// Verification and visualization
// =============================================================================

#[tokio::test]
async fn test_verify_returns_structured_verdict() {
    let verdict = json!({
        "status": "pass",
        "summary": "All cases pass.",
        "results": [{"passed": true, "input": "[2,7]", "expected": "[0,1]", "actual": "[0,1]", "error": null}],
        "feedback": "O(n) time, O(n) space.",
    })
    .to_string();
    let test = setup_app(Arc::new(FixedReasoner(verdict))).await;
    let session_id = create_freeform_session(&test, "Two sum.").await;

    let response = test
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/verify",
            json!({
                "session_id": session_id,
                "code": "def solve(nums): ...",
                "language": "python",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "pass");
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_visualize_returns_shapes() {
    let shapes = json!({
        "shapes": [
            {"type": "box", "id": "n1", "x": 0, "y": 0, "w": 140, "h": 50, "label": "node", "color": "violet"},
            {"type": "arrow", "id": "e1", "from": "n1", "to": "n1", "label": "self"},
        ]
    })
    .to_string();
    let test = setup_app(Arc::new(FixedReasoner(shapes))).await;

    let response = test
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/visualize",
            json!({"pseudocode": "build graph; bfs from start"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["shapes"].as_array().unwrap().len(), 2);
}
