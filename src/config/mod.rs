//! Configuration management for the Signward gateway
//!
//! Configuration is layered: built-in defaults, then the optional TOML config
//! file, then environment variables.

pub mod file;

use std::path::PathBuf;

use crate::gesture::GestureMap;

/// Signward gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API server configuration
    pub server: ServerConfig,

    /// Camera and detection configuration
    pub vision: VisionConfig,

    /// Text refinement configuration
    pub refiner: RefinerConfig,

    /// Speech synthesis configuration
    pub speech: SpeechConfig,

    /// API keys for external services
    pub api_keys: ApiKeys,
}

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
}

/// Camera and detection configuration
#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// Camera device index
    pub camera_index: u32,

    /// Path to the ONNX detection model
    pub model_path: PathBuf,

    /// Detection tick interval in milliseconds
    pub interval_ms: u64,

    /// Minimum score required to accept a detection
    pub confidence_threshold: f32,

    /// Gesture labels in class-index order
    pub labels: Vec<String>,
}

impl VisionConfig {
    /// Build the gesture table from the configured labels
    #[must_use]
    pub fn gesture_map(&self) -> GestureMap {
        GestureMap::from_labels(self.labels.clone())
    }
}

/// Text refinement configuration
#[derive(Debug, Clone)]
pub struct RefinerConfig {
    /// Chat-completion API base URL
    pub base_url: String,

    /// Chat model identifier
    pub model: String,

    /// Prompt template; `{gesture}` is replaced with the detected label
    pub prompt: String,
}

/// Speech synthesis configuration
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// Speech-synthesis API base URL
    pub base_url: String,

    /// TTS model identifier
    pub model: String,

    /// TTS voice identifier
    pub voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub speed: f32,

    /// Maximum number of cached audio payloads
    pub cache_capacity: usize,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (chat completions and TTS)
    pub openai: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig { port: 8460 },
            vision: VisionConfig {
                camera_index: 0,
                model_path: PathBuf::from("models/gestures.onnx"),
                interval_ms: 300,
                confidence_threshold: 0.5,
                labels: crate::gesture::DEFAULT_GESTURES
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            },
            refiner: RefinerConfig {
                base_url: "https://api.openai.com".to_string(),
                model: "gpt-4o-mini".to_string(),
                prompt: "Rephrase the hand gesture \"{gesture}\" as a short natural \
                         spoken sentence. Reply with the sentence only."
                    .to_string(),
            },
            speech: SpeechConfig {
                base_url: "https://api.openai.com".to_string(),
                model: "tts-1".to_string(),
                voice: "alloy".to_string(),
                speed: 1.0,
                cache_capacity: 256,
            },
            api_keys: ApiKeys::default(),
        }
    }
}

impl Config {
    /// Load configuration: defaults, then the TOML config file, then env vars
    #[must_use]
    pub fn load() -> Self {
        let mut config = Self::default();
        config.apply_file(&file::load_config_file());
        config.apply_env();
        config
    }

    /// Overlay values from the TOML config file
    fn apply_file(&mut self, f: &file::SignwardConfigFile) {
        if let Some(port) = f.server.port {
            self.server.port = port;
        }
        if let Some(index) = f.vision.camera_index {
            self.vision.camera_index = index;
        }
        if let Some(path) = &f.vision.model_path {
            self.vision.model_path = PathBuf::from(path);
        }
        if let Some(ms) = f.vision.interval_ms {
            self.vision.interval_ms = ms;
        }
        if let Some(threshold) = f.vision.confidence_threshold {
            self.vision.confidence_threshold = threshold;
        }
        if let Some(labels) = &f.vision.labels {
            self.vision.labels.clone_from(labels);
        }
        if let Some(url) = &f.refiner.base_url {
            self.refiner.base_url.clone_from(url);
        }
        if let Some(model) = &f.refiner.model {
            self.refiner.model.clone_from(model);
        }
        if let Some(prompt) = &f.refiner.prompt {
            self.refiner.prompt.clone_from(prompt);
        }
        if let Some(url) = &f.speech.base_url {
            self.speech.base_url.clone_from(url);
        }
        if let Some(model) = &f.speech.model {
            self.speech.model.clone_from(model);
        }
        if let Some(voice) = &f.speech.voice {
            self.speech.voice.clone_from(voice);
        }
        if let Some(speed) = f.speech.speed {
            self.speech.speed = speed;
        }
        if let Some(capacity) = f.speech.cache_capacity {
            self.speech.cache_capacity = capacity;
        }
        if let Some(key) = &f.api_keys.openai {
            self.api_keys.openai = Some(key.clone());
        }
    }

    /// Overlay values from environment variables
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                self.api_keys.openai = Some(key);
            }
        }
        if let Some(port) = env_parsed("SIGNWARD_PORT") {
            self.server.port = port;
        }
        if let Ok(path) = std::env::var("SIGNWARD_MODEL_PATH") {
            self.vision.model_path = PathBuf::from(path);
        }
        if let Some(index) = env_parsed("SIGNWARD_CAMERA_INDEX") {
            self.vision.camera_index = index;
        }
        if let Some(ms) = env_parsed("SIGNWARD_INTERVAL_MS") {
            self.vision.interval_ms = ms;
        }
    }
}

/// Read and parse an environment variable, ignoring unset or malformed values
fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
