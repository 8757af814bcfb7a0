use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub datastore: DatastoreConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub preprocess: PreprocessConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatastoreConfig {
    pub root: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrackerConfig {
    #[serde(default = "default_tracker_kind")]
    pub kind: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            kind: default_tracker_kind(),
            url: None,
            username: None,
            password: None,
        }
    }
}

fn default_tracker_kind() -> String {
    "jira".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_llm_kind")]
    pub kind: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default = "default_similar_issues_count")]
    pub similar_issues_count: usize,
    #[serde(default)]
    pub llm_temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            kind: default_llm_kind(),
            api_key: None,
            embedding_model: default_embedding_model(),
            llm_model: default_llm_model(),
            similar_issues_count: default_similar_issues_count(),
            llm_temperature: 0.0,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_llm_kind() -> String {
    "openai".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}
fn default_llm_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_similar_issues_count() -> usize {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct PreprocessConfig {
    #[serde(default = "default_length_threshold")]
    pub description_length_threshold: usize,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            description_length_threshold: default_length_threshold(),
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_length_threshold() -> usize {
    100
}
fn default_chunk_size() -> usize {
    8000
}

impl LlmConfig {
    /// Resolve the API key from config or the `OPENAI_API_KEY` environment
    /// variable. Fails fast, before any network call is attempted.
    pub fn resolve_api_key(&self) -> Result<String> {
        self.api_key_or(std::env::var("OPENAI_API_KEY").ok())
    }

    /// Resolution order: explicit config value, then the ambient key.
    fn api_key_or(&self, ambient: Option<String>) -> Result<String> {
        if let Some(key) = &self.api_key {
            if !key.is_empty() {
                return Ok(key.clone());
            }
        }
        ambient.ok_or_else(|| {
            Error::Configuration(
                "llm.api_key not set and OPENAI_API_KEY not in environment".to_string(),
            )
        })
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Configuration(format!("failed to read config file {}: {e}", path.display()))
    })?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| Error::Configuration(format!("failed to parse config file: {e}")))?;

    if config.preprocess.chunk_size == 0 {
        return Err(Error::Configuration(
            "preprocess.chunk_size must be > 0".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&config.llm.llm_temperature) {
        return Err(Error::Configuration(
            "llm.llm_temperature must be in [0.0, 2.0]".to_string(),
        ));
    }

    if config.llm.embedding_model.is_empty() {
        return Err(Error::Configuration(
            "llm.embedding_model must not be empty".to_string(),
        ));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("harness.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        (tmp, path)
    }

    #[test]
    fn test_minimal_config_defaults() {
        let (_tmp, path) = write_config("[datastore]\nroot = \"/tmp/datastore\"\n");
        let config = load_config(&path).unwrap();
        assert_eq!(config.tracker.kind, "jira");
        assert_eq!(config.llm.kind, "openai");
        assert_eq!(config.llm.embedding_model, "text-embedding-ada-002");
        assert_eq!(config.llm.similar_issues_count, 5);
        assert_eq!(config.preprocess.description_length_threshold, 100);
        assert_eq!(config.preprocess.chunk_size, 8000);
    }

    #[test]
    fn test_rejects_zero_chunk_size() {
        let (_tmp, path) = write_config(
            "[datastore]\nroot = \"/tmp/d\"\n\n[preprocess]\nchunk_size = 0\n",
        );
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_temperature() {
        let (_tmp, path) =
            write_config("[datastore]\nroot = \"/tmp/d\"\n\n[llm]\nllm_temperature = 3.5\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_api_key_from_config() {
        let llm = LlmConfig {
            api_key: Some("sk-test".to_string()),
            ..LlmConfig::default()
        };
        assert_eq!(llm.resolve_api_key().unwrap(), "sk-test");
    }

    #[test]
    fn test_missing_api_key_is_a_configuration_error() {
        // Resolution is tested without consulting the process environment,
        // so a key exported in the test runner's shell cannot mask this.
        let llm = LlmConfig {
            api_key: None,
            ..LlmConfig::default()
        };
        let err = llm.api_key_or(None).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_config_key_wins_over_ambient() {
        let llm = LlmConfig {
            api_key: Some("sk-config".to_string()),
            ..LlmConfig::default()
        };
        let key = llm.api_key_or(Some("sk-ambient".to_string())).unwrap();
        assert_eq!(key, "sk-config");
    }
}
