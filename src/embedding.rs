//! Embedding backend abstraction and the OpenAI implementation.
//!
//! Defines the [`EmbeddingBackend`] trait and [`OpenAiEmbeddings`], a
//! blocking client for the OpenAI embeddings API. A backend is tied to one
//! named `embedding_model`; the model name travels with every index the
//! backend produces so a query embedded with a different model can be
//! rejected instead of silently returning garbage matches.
//!
//! Backend failures (missing key, auth, rate limit) propagate verbatim to
//! the caller; retries, if desired, are a caller concern.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::models::TokenUsage;
use crate::registry::Registry;

/// A query vector plus the token cost of producing it.
#[derive(Debug, Clone)]
pub struct QueryEmbedding {
    pub vector: Vec<f32>,
    pub prompt_tokens: u64,
}

/// A pluggable embedding backend, selected by a string discriminator.
pub trait EmbeddingBackend: Send + Sync + std::fmt::Debug {
    /// The backend discriminator used at registration time (e.g. `"openai"`).
    fn kind(&self) -> &str;

    /// The embedding model identifier (e.g. `"text-embedding-ada-002"`).
    fn model_name(&self) -> &str;

    /// Embed a batch of texts, returning one vector per input in order,
    /// plus the usage the backend reported for the call.
    fn embed(&self, texts: &[String]) -> Result<(Vec<Vec<f32>>, TokenUsage)>;

    /// Embed a single query text.
    fn embed_query(&self, text: &str) -> Result<QueryEmbedding> {
        let (mut vectors, usage) = self.embed(&[text.to_string()])?;
        let vector = vectors.drain(..).next().ok_or_else(|| Error::Backend {
            backend: self.kind().to_string(),
            message: "empty embedding response".to_string(),
        })?;
        Ok(QueryEmbedding {
            vector,
            prompt_tokens: usage.prompt_tokens,
        })
    }
}

/// Registry of embedding backends, keyed by kind.
pub type EmbeddingRegistry = Registry<Arc<dyn EmbeddingBackend>>;

/// Create an empty embedding registry.
pub fn embedding_registry() -> EmbeddingRegistry {
    Registry::new("embedding")
}

/// Embedding backend using the OpenAI API.
///
/// Calls `POST /v1/embeddings` with the configured model over a blocking
/// HTTP client.
#[derive(Debug)]
pub struct OpenAiEmbeddings {
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiEmbeddings {
    /// Create a new OpenAI embedding backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when no API key is available,
    /// before any network call is attempted.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            api_key: config.resolve_api_key()?,
            model: config.embedding_model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }
}

impl EmbeddingBackend for OpenAiEmbeddings {
    fn kind(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn embed(&self, texts: &[String]) -> Result<(Vec<Vec<f32>>, TokenUsage)> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;

        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        debug!(batch = texts.len(), model = %self.model, "embedding batch");

        let response = client
            .post("https://api.openai.com/v1/embeddings")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().unwrap_or_default();
            return Err(Error::Backend {
                backend: "openai".to_string(),
                message: format!("embeddings API error {status}: {body_text}"),
            });
        }

        let json: serde_json::Value = response.json()?;
        parse_embeddings_response(&json)
    }
}

/// Parse the embeddings API response JSON: `data[].embedding` in input
/// order plus the `usage` block.
fn parse_embeddings_response(json: &serde_json::Value) -> Result<(Vec<Vec<f32>>, TokenUsage)> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| Error::Backend {
            backend: "openai".to_string(),
            message: "invalid embeddings response: missing data array".to_string(),
        })?;

    let mut embeddings = Vec::with_capacity(data.len());
    for item in data {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| Error::Backend {
                backend: "openai".to_string(),
                message: "invalid embeddings response: missing embedding".to_string(),
            })?;
        let vec: Vec<f32> = embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();
        embeddings.push(vec);
    }

    let usage = parse_usage(json);
    Ok((embeddings, usage))
}

/// Extract the `usage` block from an API response, defaulting to zero.
pub(crate) fn parse_usage(json: &serde_json::Value) -> TokenUsage {
    let usage = json.get("usage");
    let field = |name: &str| {
        usage
            .and_then(|u| u.get(name))
            .and_then(|v| v.as_u64())
            .unwrap_or(0)
    };
    TokenUsage {
        prompt_tokens: field("prompt_tokens"),
        completion_tokens: field("completion_tokens"),
        total_tokens: field("total_tokens"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_embeddings_response() {
        let json = serde_json::json!({
            "data": [
                { "index": 0, "embedding": [0.1, 0.2] },
                { "index": 1, "embedding": [0.3, 0.4] }
            ],
            "usage": { "prompt_tokens": 7, "total_tokens": 7 }
        });
        let (vectors, usage) = parse_embeddings_response(&json).unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0], vec![0.1f32, 0.2]);
        assert_eq!(usage.prompt_tokens, 7);
        assert_eq!(usage.completion_tokens, 0);
    }

    #[test]
    fn test_parse_embeddings_response_missing_data() {
        let json = serde_json::json!({ "error": { "message": "invalid key" } });
        assert!(parse_embeddings_response(&json).is_err());
    }

    #[test]
    fn test_explicit_api_key_reaches_the_client() {
        // Key resolution at construction time, without consulting the
        // process environment. The no-key error path is covered in the
        // config module, where resolution is testable in isolation.
        let config = LlmConfig {
            api_key: Some("sk-test".to_string()),
            ..LlmConfig::default()
        };
        assert!(OpenAiEmbeddings::new(&config).is_ok());
    }
}
