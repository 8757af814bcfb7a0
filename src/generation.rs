//! Generation backend abstraction and the OpenAI chat implementation.
//!
//! A [`GenerationBackend`] turns a system prompt, a user prompt, and a
//! temperature into drafted text plus usage figures. There is no fallback
//! answer: a failing backend call propagates to the caller uncaught.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::LlmConfig;
use crate::embedding::parse_usage;
use crate::error::{Error, Result};
use crate::models::TokenUsage;
use crate::registry::Registry;

/// Text produced by a generation backend plus its reported usage.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub usage: TokenUsage,
}

/// A pluggable text-generation backend, selected by a string discriminator.
pub trait GenerationBackend: Send + Sync {
    /// The backend discriminator used at registration time (e.g. `"openai"`).
    fn kind(&self) -> &str;

    /// The chat model identifier (e.g. `"gpt-3.5-turbo"`).
    fn model_name(&self) -> &str;

    /// Generate a completion for the given prompts at `temperature`.
    fn generate(&self, system_prompt: &str, user_prompt: &str, temperature: f32)
        -> Result<Completion>;
}

/// Registry of generation backends, keyed by kind.
pub type GenerationRegistry = Registry<Arc<dyn GenerationBackend>>;

/// Create an empty generation registry.
pub fn generation_registry() -> GenerationRegistry {
    Registry::new("generation")
}

/// Generation backend using the OpenAI chat completions API.
pub struct OpenAiChat {
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiChat {
    /// Create a new OpenAI chat backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when no API key is available,
    /// before any network call is attempted.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            api_key: config.resolve_api_key()?,
            model: config.llm_model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }
}

impl GenerationBackend for OpenAiChat {
    fn kind(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<Completion> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;

        let body = serde_json::json!({
            "model": self.model,
            "temperature": temperature,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt }
            ],
        });

        debug!(model = %self.model, temperature, "requesting completion");

        let response = client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().unwrap_or_default();
            return Err(Error::Backend {
                backend: "openai".to_string(),
                message: format!("chat API error {status}: {body_text}"),
            });
        }

        let json: serde_json::Value = response.json()?;
        parse_chat_response(&json)
    }
}

/// Parse the chat completions response: first choice's message content
/// plus the `usage` block.
fn parse_chat_response(json: &serde_json::Value) -> Result<Completion> {
    let text = json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .ok_or_else(|| Error::Backend {
            backend: "openai".to_string(),
            message: "invalid chat response: missing message content".to_string(),
        })?;

    Ok(Completion {
        text: text.to_string(),
        usage: parse_usage(json),
    })
}
