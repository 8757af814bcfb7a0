//! Crate-wide error taxonomy.
//!
//! Every fallible operation returns [`Result`]. Failure kinds the caller
//! is expected to branch on (missing index, model mismatch, unknown
//! backend kind, rejected issue record) get their own variant;
//! infrastructure failures from I/O, JSON, and HTTP pass through with
//! `#[from]` so `?` works at the call sites.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Bad or incomplete configuration, including a missing API key.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A backend (tracker, embedding, or generation) failed or returned a
    /// response the client could not use.
    #[error("{backend} backend error: {message}")]
    Backend { backend: String, message: String },

    /// An imported issue record is missing a mandatory field.
    #[error("issue '{key}' is missing mandatory field '{field}'")]
    InvalidIssue { key: String, field: &'static str },

    /// No persisted index exists for the project. Embeddings were never
    /// generated, or the datastore root is wrong.
    #[error("no vector index for project '{project}' at {} (generate embeddings first)", .path.display())]
    IndexNotFound { project: String, path: PathBuf },

    /// The query's embedding model differs from the model recorded in the
    /// persisted index; scores across models are meaningless.
    #[error(
        "index for project '{project}' was built with model '{index_model}' \
         but the query uses '{query_model}'; regenerate the embeddings"
    )]
    ModelMismatch {
        project: String,
        index_model: String,
        query_model: String,
    },

    /// Lookup of an unregistered backend kind.
    #[error("unknown {family} backend '{kind}' (registered: {})", .known.join(", "))]
    NotRegistered {
        family: &'static str,
        kind: String,
        known: Vec<String>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_not_found_names_project_and_path() {
        let err = Error::IndexNotFound {
            project: "DEMO".to_string(),
            path: PathBuf::from("/data/embeddings/openai/index_DEMO_m1.json"),
        };
        let msg = err.to_string();
        assert!(msg.contains("DEMO"));
        assert!(msg.contains("index_DEMO_m1.json"));
    }

    #[test]
    fn test_not_registered_lists_known_kinds() {
        let err = Error::NotRegistered {
            family: "embedding",
            kind: "cohere".to_string(),
            known: vec!["openai".to_string(), "stub".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("embedding"));
        assert!(msg.contains("cohere"));
        assert!(msg.contains("openai, stub"));
    }

    #[test]
    fn test_io_errors_convert_with_question_mark() {
        fn read() -> Result<String> {
            Ok(std::fs::read_to_string("/nonexistent/path")?)
        }
        assert!(matches!(read().unwrap_err(), Error::Io(_)));
    }
}
