//! HTTP API server for the Signward gateway

pub mod health;
pub mod refine;
pub mod speech;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::refiner::TextRefiner;
use crate::speech::SpeechSynthesizer;

/// Shared state for API handlers
pub struct ApiState {
    /// Text refiner; absent when no API key is configured
    pub refiner: Option<Arc<TextRefiner>>,
    /// Speech synthesizer; absent when no API key is configured
    pub synthesizer: Option<Arc<SpeechSynthesizer>>,
    /// Whether the detection pipeline is currently running
    pub pipeline_running: Arc<AtomicBool>,
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Create a new API server
    #[must_use]
    pub const fn new(state: Arc<ApiState>, port: u16) -> Self {
        Self { state, port }
    }

    /// Build the router with all routes
    fn router(&self) -> Router {
        let router = Router::new()
            .nest("/api/refine", refine::router(Arc::clone(&self.state)))
            .nest("/api/speech", speech::router(Arc::clone(&self.state)))
            .merge(health::router())
            .merge(health::status_router(Arc::clone(&self.state)));

        // CORS layer for cross-origin requests from a frontend
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if the server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}

/// Proxy endpoint errors
#[derive(Debug)]
pub enum ProxyError {
    /// Provider credential not configured
    NotConfigured(&'static str),
    /// Malformed or empty request
    BadRequest(&'static str),
    /// Upstream call failed
    Upstream(String),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
        }

        let (status, error) = match self {
            Self::NotConfigured(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.to_string()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.to_string()),
            Self::Upstream(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
