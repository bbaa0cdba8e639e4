//! Text refinement proxy endpoint

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};

use super::{ApiState, ProxyError};

/// Build the refine router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new().route("/", post(refine)).with_state(state)
}

/// Refinement request
#[derive(Debug, Deserialize)]
pub struct RefineRequest {
    pub text: String,
}

/// Refinement response
#[derive(Debug, Serialize)]
pub struct RefineResponse {
    pub text: String,
}

/// Refine a gesture label into natural-language text
async fn refine(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<RefineRequest>,
) -> Result<Json<RefineResponse>, ProxyError> {
    let refiner = state
        .refiner
        .as_ref()
        .ok_or(ProxyError::NotConfigured("refinement not configured"))?;

    if request.text.is_empty() {
        return Err(ProxyError::BadRequest("empty text"));
    }

    let text = refiner.refine(&request.text).await.map_err(|e| {
        tracing::error!(error = %e, "refine failed");
        ProxyError::Upstream(e.to_string())
    })?;

    Ok(Json(RefineResponse { text }))
}
