//! Shared test utilities
//!
//! Provides stub upstream servers on ephemeral ports so the proxy endpoints
//! can be exercised without real provider credentials.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use tokio::net::TcpListener;

/// Serve the router on an ephemeral port and return its base URL
pub async fn spawn_upstream(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind stub upstream");
    let addr = listener.local_addr().expect("stub has no local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    format!("http://{addr}")
}

/// Chat-completion stub that always replies with the given content
///
/// Returns the base URL and a counter of requests received.
pub async fn spawn_chat_stub(content: &str) -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let content = content.to_string();
    let counter = Arc::clone(&calls);

    let router = Router::new().route(
        "/v1/chat/completions",
        post(move || {
            let content = content.clone();
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Json(serde_json::json!({
                    "choices": [
                        {"message": {"role": "assistant", "content": content}}
                    ]
                }))
            }
        }),
    );

    (spawn_upstream(router).await, calls)
}

/// Speech-synthesis stub that always returns the given MP3 payload
///
/// Returns the base URL and a counter of requests received.
pub async fn spawn_speech_stub(audio: &'static [u8]) -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let router = Router::new().route(
        "/v1/audio/speech",
        post(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                ([(header::CONTENT_TYPE, "audio/mpeg")], audio.to_vec())
            }
        }),
    );

    (spawn_upstream(router).await, calls)
}

/// Stub whose chat and speech routes both fail with HTTP 500
pub async fn spawn_failing_stub() -> String {
    let router = Router::new()
        .route("/v1/chat/completions", post(fail))
        .route("/v1/audio/speech", post(fail));

    spawn_upstream(router).await
}

async fn fail() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": {"message": "upstream exploded"}})),
    )
}
