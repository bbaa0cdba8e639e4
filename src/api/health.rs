//! Health and status endpoints

use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use super::ApiState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Liveness probe
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build health router (liveness only, no state needed)
pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

/// System status response
#[derive(Serialize)]
pub struct StatusResponse {
    pub version: &'static str,
    pub detection: &'static str,
    pub refine_available: bool,
    pub speech_available: bool,
}

/// Get gateway status
async fn status(State(state): State<Arc<ApiState>>) -> Json<StatusResponse> {
    let detection = if state.pipeline_running.load(Ordering::SeqCst) {
        "running"
    } else {
        "idle"
    };

    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        detection,
        refine_available: state.refiner.is_some(),
        speech_available: state.synthesizer.is_some(),
    })
}

/// Build status router (needs state)
pub fn status_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/status", get(status))
        .with_state(state)
}
