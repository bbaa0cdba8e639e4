//! API endpoint integration tests

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use signward_gateway::TextRefiner;
use signward_gateway::api::{self, ApiState};
use signward_gateway::config::{RefinerConfig, SpeechConfig};
use signward_gateway::speech::{SpeechService, SpeechSynthesizer};
use tower::ServiceExt;

mod common;
use common::{spawn_chat_stub, spawn_failing_stub, spawn_speech_stub};

static STUB_MP3: &[u8] = b"ID3\x03\x00stub-mp3-payload";

/// Build a test API router
fn build_test_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .nest("/api/refine", api::refine::router(Arc::clone(&state)))
        .nest("/api/speech", api::speech::router(Arc::clone(&state)))
        .merge(api::health::router())
        .merge(api::health::status_router(state))
}

fn test_refiner(base_url: &str) -> Arc<TextRefiner> {
    let config = RefinerConfig {
        base_url: base_url.to_string(),
        model: "gpt-4o-mini".to_string(),
        prompt: "Speak the gesture \"{gesture}\" as a sentence.".to_string(),
    };
    Arc::new(TextRefiner::new("test-key".to_string(), &config).expect("refiner"))
}

fn test_synthesizer(base_url: &str) -> Arc<SpeechSynthesizer> {
    let config = SpeechConfig {
        base_url: base_url.to_string(),
        model: "tts-1".to_string(),
        voice: "alloy".to_string(),
        speed: 1.0,
        cache_capacity: 8,
    };
    Arc::new(SpeechSynthesizer::new("test-key".to_string(), &config).expect("synthesizer"))
}

fn test_state(
    refiner: Option<Arc<TextRefiner>>,
    synthesizer: Option<Arc<SpeechSynthesizer>>,
) -> Arc<ApiState> {
    Arc::new(ApiState {
        refiner,
        synthesizer,
        pipeline_running: Arc::new(AtomicBool::new(false)),
    })
}

fn json_request(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_router(test_state(None, None));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_status_reports_availability() {
    let (chat_url, _) = spawn_chat_stub("ignored").await;
    let state = test_state(Some(test_refiner(&chat_url)), None);
    let app = build_test_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["detection"], "idle");
    assert_eq!(json["refine_available"], true);
    assert_eq!(json["speech_available"], false);
}

#[tokio::test]
async fn test_refine_proxies_upstream_completion() {
    let (chat_url, calls) = spawn_chat_stub("Thumbs up!").await;
    let app = build_test_router(test_state(Some(test_refiner(&chat_url)), None));

    let response = app
        .oneshot(json_request(
            "/api/refine",
            &serde_json::json!({"text": "thumbs_up"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["text"], "Thumbs up!");
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_refine_rejects_empty_text() {
    let (chat_url, calls) = spawn_chat_stub("ignored").await;
    let app = build_test_router(test_state(Some(test_refiner(&chat_url)), None));

    let response = app
        .oneshot(json_request("/api/refine", &serde_json::json!({"text": ""})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["error"].is_string());
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_refine_unavailable_without_credentials() {
    let app = build_test_router(test_state(None, None));

    let response = app
        .oneshot(json_request(
            "/api/refine",
            &serde_json::json!({"text": "fist"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json = body_json(response).await;
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_refine_maps_upstream_failure_to_500() {
    let failing_url = spawn_failing_stub().await;
    let app = build_test_router(test_state(Some(test_refiner(&failing_url)), None));

    let response = app
        .oneshot(json_request(
            "/api/refine",
            &serde_json::json!({"text": "open_palm"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_speech_returns_mpeg_audio() {
    let (speech_url, _) = spawn_speech_stub(STUB_MP3).await;
    let app = build_test_router(test_state(None, Some(test_synthesizer(&speech_url))));

    let response = app
        .oneshot(json_request(
            "/api/speech",
            &serde_json::json!({"text": "Thumbs up!"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "audio/mpeg"
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], STUB_MP3);
}

#[tokio::test]
async fn test_speech_rejects_empty_text() {
    let (speech_url, calls) = spawn_speech_stub(STUB_MP3).await;
    let app = build_test_router(test_state(None, Some(test_synthesizer(&speech_url))));

    let response = app
        .oneshot(json_request("/api/speech", &serde_json::json!({"text": ""})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["error"].is_string());
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_speech_unavailable_without_credentials() {
    let app = build_test_router(test_state(None, None));

    let response = app
        .oneshot(json_request(
            "/api/speech",
            &serde_json::json!({"text": "hello"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json = body_json(response).await;
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_speech_maps_upstream_failure_to_500() {
    let failing_url = spawn_failing_stub().await;
    let app = build_test_router(test_state(None, Some(test_synthesizer(&failing_url))));

    let response = app
        .oneshot(json_request(
            "/api/speech",
            &serde_json::json!({"text": "hello"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_speech_service_caches_exact_text() {
    let (speech_url, calls) = spawn_speech_stub(STUB_MP3).await;
    let service = SpeechService::new(test_synthesizer(&speech_url), 8);

    let first = service.fetch("Thumbs up!").await.unwrap();
    let second = service.fetch("Thumbs up!").await.unwrap();
    let other = service.fetch("Peace!").await.unwrap();

    assert_eq!(first.as_slice(), STUB_MP3);
    assert_eq!(second.as_slice(), STUB_MP3);
    assert_eq!(other.as_slice(), STUB_MP3);
    // The repeated text is served from the cache, not the upstream
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
}
