//! Error types for the Signward gateway

use thiserror::Error;

/// Result type alias for Signward operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Signward gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Camera device error
    #[error("camera error: {0}")]
    Camera(String),

    /// Detection model load error
    #[error("model error: {0}")]
    Model(String),

    /// Inference execution error
    #[error("inference error: {0}")]
    Inference(String),

    /// Text refinement error
    #[error("refine error: {0}")]
    Refine(String),

    /// Speech synthesis error
    #[error("speech error: {0}")]
    Speech(String),

    /// Audio playback error
    #[error("playback error: {0}")]
    Playback(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
