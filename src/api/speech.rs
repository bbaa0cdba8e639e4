//! Speech synthesis proxy endpoint

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Deserialize;

use super::{ApiState, ProxyError};

/// Build the speech router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new().route("/", post(synthesize)).with_state(state)
}

/// Synthesis request
#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    pub text: String,
}

/// Synthesize text to speech
///
/// Returns audio in MP3 format
async fn synthesize(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SynthesizeRequest>,
) -> Result<Response, ProxyError> {
    let synthesizer = state
        .synthesizer
        .as_ref()
        .ok_or(ProxyError::NotConfigured("speech synthesis not configured"))?;

    if request.text.is_empty() {
        return Err(ProxyError::BadRequest("empty text"));
    }

    let audio = synthesizer.synthesize(&request.text).await.map_err(|e| {
        tracing::error!(error = %e, "synthesis failed");
        ProxyError::Upstream(e.to_string())
    })?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "audio/mpeg")],
        audio,
    )
        .into_response())
}
