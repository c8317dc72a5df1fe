//! Anthropic messages API chat client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use advisor_core::{ChatProvider, Error, Result, Settings};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

/// Chat client for the Anthropic messages API
pub struct AnthropicChat {
    client: Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct MessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
}

impl AnthropicChat {
    pub fn new(api_key: &str, model: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::Configuration("missing Anthropic API key".to_string()));
        }
        if model.trim().is_empty() {
            return Err(Error::Configuration("missing Anthropic model name".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.trim().to_string(),
            model: model.to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(&settings.anthropic_api_key, &settings.anthropic_model)
    }

    /// Context chunks go in front of the instruction so the model reads
    /// the evidence before the question
    fn build_input(prompt: &str, context: &[String]) -> String {
        if context.is_empty() {
            return format!("Context: (no relevant material was found)\n\n{}", prompt);
        }
        let mut input = String::from("Context:\n\n");
        for (i, chunk) in context.iter().enumerate() {
            input.push_str(&format!("[{}] {}\n\n", i + 1, chunk));
        }
        input.push_str(prompt);
        input
    }
}

#[async_trait]
impl ChatProvider for AnthropicChat {
    async fn complete(&self, prompt: &str, context: &[String]) -> Result<String> {
        let input = Self::build_input(prompt, context);
        let body = MessageRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: &input,
            }],
        };

        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(format!("chat request: {}", e))
                } else {
                    Error::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!(
                "chat endpoint returned {}: {}",
                status, detail
            )));
        }

        let parsed: MessageResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        let text: String = parsed
            .content
            .iter()
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(Error::Provider("chat endpoint returned no text".to_string()));
        }
        debug!(model = %self.model, chars = text.len(), "completion received");
        Ok(text)
    }

    async fn health(&self) -> Result<()> {
        // Reachability in the sense of the health endpoint: the client is
        // configured with credentials and a model. A live round trip per
        // health probe would burn quota.
        if self.api_key.is_empty() || self.model.is_empty() {
            return Err(Error::Configuration("chat provider not configured".to_string()));
        }
        Ok(())
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
