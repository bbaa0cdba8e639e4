//! Speech synthesis via a hosted text-to-speech endpoint

use serde::Serialize;

use crate::config::SpeechConfig;
use crate::{Error, Result};

/// Synthesizes speech from text
pub struct SpeechSynthesizer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    voice: String,
    speed: f32,
}

impl SpeechSynthesizer {
    /// Create a new synthesizer
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String, config: &SpeechConfig) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "API key required for speech synthesis".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            voice: config.voice.clone(),
            speed: config.speed,
        })
    }

    /// Synthesize text to speech
    ///
    /// # Returns
    ///
    /// Audio bytes (MP3 format)
    ///
    /// # Errors
    ///
    /// Returns error if the upstream call fails or returns a non-2xx status
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(Serialize)]
        struct SpeechRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
        };

        let response = self
            .client
            .post(format!("{}/v1/audio/speech", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Speech(format!("TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        tracing::debug!(text, bytes = audio.len(), "speech synthesized");
        Ok(audio.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn missing_api_key_is_rejected() {
        let config = Config::default();
        assert!(SpeechSynthesizer::new(String::new(), &config.speech).is_err());
    }
}
