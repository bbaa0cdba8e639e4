//! Text refinement via a hosted chat-completion endpoint
//!
//! Turns a raw gesture label into a short natural-language sentence.

use serde::{Deserialize, Serialize};

use crate::config::RefinerConfig;
use crate::{Error, Result};

/// Placeholder in the prompt template replaced by the detected label
const GESTURE_PLACEHOLDER: &str = "{gesture}";

/// Refines gesture labels into natural-language text
pub struct TextRefiner {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    prompt: String,
}

impl TextRefiner {
    /// Create a new refiner
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String, config: &RefinerConfig) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "API key required for text refinement".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            prompt: config.prompt.clone(),
        })
    }

    /// Refine a gesture label into natural-language text
    ///
    /// # Errors
    ///
    /// Returns error if the upstream call fails or returns a non-2xx status
    pub async fn refine(&self, label: &str) -> Result<String> {
        let prompt = if self.prompt.contains(GESTURE_PLACEHOLDER) {
            self.prompt.replace(GESTURE_PLACEHOLDER, label)
        } else {
            label.to_string()
        };

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Refine(format!(
                "chat completion error {status}: {body}"
            )));
        }

        let result: ChatCompletionResponse = response.json().await?;
        let text = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Refine("empty completion".to_string()))?;

        tracing::debug!(label, refined = %text, "label refined");
        Ok(text)
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
