//! Signward Gateway - gesture-to-speech gateway
//!
//! This library provides the core functionality for the Signward gateway:
//! - Camera capture and gesture detection
//! - Text refinement via a hosted chat-completion endpoint
//! - Speech synthesis, caching, and playback
//! - HTTP proxy endpoints for external frontends
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  Capture loop                        │
//! │   Camera  │  Detection model  │  Gesture decode     │
//! └────────────────────┬────────────────────────────────┘
//!                      │ on label change
//! ┌────────────────────▼────────────────────────────────┐
//! │               Signward Gateway                       │
//! │   Refiner  │  Speech cache  │  Playback  │  API     │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │           Hosted providers (OpenAI-compatible)       │
//! │   Chat completions  │  Speech synthesis             │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod gesture;
pub mod pipeline;
pub mod refiner;
pub mod speech;
pub mod vision;

pub use config::Config;
pub use error::{Error, Result};
pub use gesture::{DEFAULT_GESTURES, GestureMap, UNKNOWN_LABEL};
pub use pipeline::GesturePipeline;
pub use refiner::TextRefiner;
pub use speech::{AudioCache, PlaybackHandle, SpeechPlayback, SpeechService, SpeechSynthesizer};
pub use vision::{
    CameraCapture, Detection, DetectionModel, GestureDetector, OnnxGestureModel, RawDetections,
};
