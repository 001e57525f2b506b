//! Provider HTTP tests
//!
//! These tests exercise the Claude and Gemini adapters and the coordinator
//! against local wiremock servers speaking each vendor's wire format.

use base64::Engine;
use glimpse_core::{
    AnalysisCoordinator, AnalysisError, Analyzer, AnalyzerConfig, AnalyzerRegistry,
    ClaudeAnalyzer, GeminiAnalyzer, ProviderId, DESCRIBE_PROMPT,
};
use image::{DynamicImage, GenericImageView};
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::SystemTime;
use wiremock::{
    matchers::{body_partial_json, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const GEMINI_PATH: &str = "/v1beta/models/gemini-test:generateContent";

fn claude(server: &MockServer, key: &str) -> ClaudeAnalyzer {
    ClaudeAnalyzer::new(AnalyzerConfig::new(key, "claude-test")).with_base_url(&server.uri())
}

fn gemini(server: &MockServer, key: &str) -> GeminiAnalyzer {
    GeminiAnalyzer::new(AnalyzerConfig::new(key, "gemini-test")).with_base_url(&server.uri())
}

fn claude_response(text: &str) -> serde_json::Value {
    json!({
        "id": "msg_013Zva2CMHLNnXjNJJKqJ2EF",
        "type": "message",
        "role": "assistant",
        "model": "claude-test",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
        "stop_sequence": null,
        "usage": {"input_tokens": 1534, "output_tokens": 12}
    })
}

fn gemini_response(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"parts": [{"text": text}], "role": "model"},
            "finishReason": "STOP",
            "index": 0
        }],
        "usageMetadata": {"promptTokenCount": 263, "candidatesTokenCount": 5, "totalTokenCount": 268}
    })
}

/// Decode the base64 image embedded at `pointer` in a recorded request body.
fn uploaded_image(body: &[u8], pointer: &str) -> DynamicImage {
    let value: serde_json::Value = serde_json::from_slice(body).unwrap();
    let data = value.pointer(pointer).and_then(|v| v.as_str()).unwrap();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(data)
        .unwrap();
    image::load_from_memory_with_format(&bytes, image::ImageFormat::Jpeg).unwrap()
}

#[tokio::test]
async fn test_claude_success_sends_expected_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({"model": "claude-test", "max_tokens": 1024})))
        .respond_with(ResponseTemplate::new(200).set_body_json(claude_response("A cat asleep on a windowsill.")))
        .expect(1)
        .mount(&server)
        .await;

    let analyzer = claude(&server, "sk-test");
    let before = SystemTime::now();
    let result = analyzer
        .analyze(&DynamicImage::new_rgb8(3000, 1500))
        .await
        .unwrap();
    let after = SystemTime::now();

    assert_eq!(result.text, "A cat asleep on a windowsill.");
    assert_eq!(result.provider, ProviderId::Claude);
    assert!(result.timestamp >= before && result.timestamp <= after);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["messages"][0]["content"][1]["text"], DESCRIBE_PROMPT);
    assert_eq!(
        body["messages"][0]["content"][0]["source"]["media_type"],
        "image/jpeg"
    );

    let uploaded = uploaded_image(&requests[0].body, "/messages/0/content/0/source/data");
    assert_eq!(uploaded.dimensions(), (1024, 512));
}

#[tokio::test]
async fn test_claude_unauthorized_is_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let err = claude(&server, "sk-bad")
        .analyze(&DynamicImage::new_rgb8(64, 64))
        .await
        .unwrap_err();

    match &err {
        AnalysisError::Api { status, body } => {
            assert_eq!(*status, 401);
            assert_eq!(body, "unauthorized");
        }
        other => panic!("expected ApiError, got {other:?}"),
    }
    let message = err.to_string();
    assert!(message.contains("401"));
    assert!(message.contains("unauthorized"));
}

#[tokio::test]
async fn test_claude_missing_text_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "msg_1", "content": []})))
        .mount(&server)
        .await;

    let err = claude(&server, "sk-test")
        .analyze(&DynamicImage::new_rgb8(64, 64))
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_empty_credentials_issue_no_requests() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = claude(&server, "")
        .analyze(&DynamicImage::new_rgb8(64, 64))
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::MissingCredential(ProviderId::Claude)));

    let err = gemini(&server, "")
        .analyze(&DynamicImage::new_rgb8(64, 64))
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::MissingCredential(ProviderId::Gemini)));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_gemini_success_sends_key_in_query() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(query_param("key", "gm-test"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_response("A row of bicycles.")))
        .expect(1)
        .mount(&server)
        .await;

    let before = SystemTime::now();
    let result = gemini(&server, "gm-test")
        .analyze(&DynamicImage::new_rgb8(800, 600))
        .await
        .unwrap();
    let after = SystemTime::now();

    assert_eq!(result.text, "A row of bicycles.");
    assert_eq!(result.provider, ProviderId::Gemini);
    assert!(result.timestamp >= before && result.timestamp <= after);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["contents"][0]["parts"][0]["text"], DESCRIBE_PROMPT);
    assert_eq!(body["contents"][0]["parts"][1]["inline_data"]["mime_type"], "image/jpeg");
    assert!(body.get("generationConfig").is_none());

    let uploaded = uploaded_image(&requests[0].body, "/contents/0/parts/1/inline_data/data");
    assert_eq!(uploaded.dimensions(), (800, 600));
}

#[tokio::test]
async fn test_gemini_server_error_is_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(
            ResponseTemplate::new(503).set_body_string(r#"{"error": {"code": 503, "status": "UNAVAILABLE"}}"#),
        )
        .mount(&server)
        .await;

    let err = gemini(&server, "gm-test")
        .analyze(&DynamicImage::new_rgb8(64, 64))
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::Api { status: 503, ref body } if body.contains("UNAVAILABLE")));
}

#[tokio::test]
async fn test_gemini_missing_parts_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"candidates": [{"content": {"role": "model"}}]})),
        )
        .mount(&server)
        .await;

    let err = gemini(&server, "gm-test")
        .analyze(&DynamicImage::new_rgb8(64, 64))
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    // Nothing listens on port 1.
    let analyzer = ClaudeAnalyzer::new(AnalyzerConfig::new("sk-test", "claude-test"))
        .with_base_url("http://127.0.0.1:1");
    let err = analyzer
        .analyze(&DynamicImage::new_rgb8(64, 64))
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::Network(_)));
    assert!(err.to_string().starts_with("Network error"));
}

#[tokio::test]
async fn test_gemini_network_error_does_not_leak_key() {
    const KEY: &str = "gm-secret-3f9a";
    let unreachable = || {
        GeminiAnalyzer::new(AnalyzerConfig::new(KEY, "gemini-test"))
            .with_base_url("http://127.0.0.1:1")
    };

    let err = unreachable()
        .analyze(&DynamicImage::new_rgb8(64, 64))
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::Network(_)));
    assert!(!err.to_string().contains(KEY));
    assert!(!format!("{err:?}").contains(KEY));

    let registry = AnalyzerRegistry::new().with(Arc::new(unreachable()));
    let coordinator = AnalysisCoordinator::new(registry, ProviderId::Gemini);
    coordinator
        .analyze(&DynamicImage::new_rgb8(64, 64))
        .await
        .unwrap_err();

    let state = coordinator.state();
    let published = state.last_error.expect("network failure is published");
    assert!(published.message.starts_with("Network error"));
    assert!(!published.message.contains(KEY));
}

#[tokio::test]
async fn test_coordinator_with_only_gemini_configured() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(query_param("key", "gm-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "A red bicycle."}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let registry = AnalyzerRegistry::new().with(Arc::new(gemini(&server, "gm-test")));
    let coordinator = AnalysisCoordinator::new(registry, ProviderId::Claude);

    assert_eq!(
        coordinator.available_providers(),
        BTreeSet::from([ProviderId::Gemini])
    );
    assert_eq!(coordinator.selected_provider(), ProviderId::Gemini);

    coordinator
        .analyze(&DynamicImage::new_rgb8(1280, 720))
        .await
        .unwrap();

    let state = coordinator.state();
    assert!(!state.is_analyzing);
    let result = state.last_result.unwrap();
    assert_eq!(result.text, "A red bicycle.");
    assert_eq!(result.provider, ProviderId::Gemini);
    assert!(state.last_error.is_none());
}

#[tokio::test]
async fn test_coordinator_publishes_api_error_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let registry = AnalyzerRegistry::new().with(Arc::new(claude(&server, "sk-bad")));
    let coordinator = AnalysisCoordinator::new(registry, ProviderId::Claude);

    assert!(coordinator.analyze(&DynamicImage::new_rgb8(64, 64)).await.is_err());

    let state = coordinator.state();
    assert!(!state.is_analyzing);
    assert!(state.last_result.is_none());
    let error = state.last_error.unwrap();
    assert_eq!(error.message, "API error: HTTP 401: unauthorized");
}
