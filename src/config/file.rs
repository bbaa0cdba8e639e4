//! TOML configuration file loading
//!
//! Supports `~/.config/signward/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct SignwardConfigFile {
    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Camera and detection configuration
    #[serde(default)]
    pub vision: VisionFileConfig,

    /// Text refinement configuration
    #[serde(default)]
    pub refiner: RefinerFileConfig,

    /// Speech synthesis configuration
    #[serde(default)]
    pub speech: SpeechFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// API server port
    pub port: Option<u16>,
}

/// Camera and detection configuration
#[derive(Debug, Default, Deserialize)]
pub struct VisionFileConfig {
    /// Camera device index
    pub camera_index: Option<u32>,

    /// Path to the ONNX detection model
    pub model_path: Option<String>,

    /// Detection tick interval in milliseconds
    pub interval_ms: Option<u64>,

    /// Minimum score to accept a detection
    pub confidence_threshold: Option<f32>,

    /// Gesture labels in class-index order
    pub labels: Option<Vec<String>>,
}

/// Text refinement configuration
#[derive(Debug, Default, Deserialize)]
pub struct RefinerFileConfig {
    /// Chat-completion API base URL
    pub base_url: Option<String>,

    /// Chat model identifier (e.g. "gpt-4o-mini")
    pub model: Option<String>,

    /// Prompt template with a `{gesture}` placeholder
    pub prompt: Option<String>,
}

/// Speech synthesis configuration
#[derive(Debug, Default, Deserialize)]
pub struct SpeechFileConfig {
    /// Speech-synthesis API base URL
    pub base_url: Option<String>,

    /// TTS model identifier (e.g. "tts-1")
    pub model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub voice: Option<String>,

    /// TTS speed multiplier
    pub speed: Option<f32>,

    /// Maximum number of cached audio payloads
    pub cache_capacity: Option<usize>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `SignwardConfigFile::default()` if the file doesn't exist or can't
/// be parsed.
#[must_use]
pub fn load_config_file() -> SignwardConfigFile {
    let Some(path) = config_file_path() else {
        return SignwardConfigFile::default();
    };

    if !path.exists() {
        return SignwardConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                SignwardConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            SignwardConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/signward/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("signward").join("config.toml"))
}
