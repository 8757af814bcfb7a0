//! Similarity search over a persisted vector index.
//!
//! Loads the project's index, embeds the query with the same backend that
//! built the index, and returns the top-`k` chunk texts by cosine
//! similarity, plus the token cost of embedding the query.
//!
//! Two failure modes are deliberate policy here rather than inherited
//! behavior:
//!
//! - a missing index is a hard error ([`crate::error::Error::IndexNotFound`]),
//!   never an empty result — an empty result would mask "embeddings were
//!   never generated";
//! - a query model that differs from the index's recorded model is
//!   rejected with [`crate::error::Error::ModelMismatch`] — a mismatched
//!   search returns no error and pure garbage otherwise.
//!
//! `k = 0` short-circuits to an empty result with zero token cost without
//! touching the index or the embedding backend.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::embedding::EmbeddingBackend;
use crate::error::{Error, Result};
use crate::index::{index_path, VectorIndex};
use crate::registry::Registry;

/// Matched chunk texts plus the query's embedding token cost.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Plain text of the matched chunks, best first.
    pub matches: Vec<String>,
    /// Tokens consumed embedding the query, for cost accounting upstream.
    pub query_tokens: u64,
}

/// A pluggable similarity-search backend, selected by a string
/// discriminator.
pub trait VectorSearch: Send + Sync {
    /// The backend discriminator used at registration time (e.g. `"flat"`).
    fn kind(&self) -> &str;

    /// Return the `k` nearest chunks for the query, best first, plus the
    /// token cost of embedding the query.
    fn similarity_search(
        &self,
        project: &str,
        task_summary: &str,
        task_desc: &str,
        k: usize,
    ) -> Result<SearchOutcome>;
}

/// Registry of vector-search backends, keyed by kind.
pub type VectorSearchRegistry = Registry<Arc<dyn VectorSearch>>;

/// Create an empty vector-search registry.
pub fn vector_search_registry() -> VectorSearchRegistry {
    Registry::new("vector store")
}

/// Flat-file vector store: the read-side view over the indexes one
/// embedding backend has produced. Scans every entry of the loaded index;
/// corpora here are small enough that nothing smarter is needed.
pub struct VectorStore {
    backend: Arc<dyn EmbeddingBackend>,
    embeddings_root: PathBuf,
}

impl VectorStore {
    /// Create a store rooted at `<datastore root>/embeddings`.
    pub fn new(datastore_root: &std::path::Path, backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self {
            backend,
            embeddings_root: datastore_root.join("embeddings"),
        }
    }

    /// Load the persisted index for `project`.
    pub fn load_index(&self, project: &str) -> Result<VectorIndex> {
        let path = index_path(
            &self.embeddings_root,
            self.backend.kind(),
            project,
            self.backend.model_name(),
        );
        VectorIndex::load(project, &path)
    }
}

impl VectorSearch for VectorStore {
    fn kind(&self) -> &str {
        "flat"
    }

    /// The query text is `"Summary: {summary}\nDescription: {description}"`,
    /// embedded with this store's backend.
    fn similarity_search(
        &self,
        project: &str,
        task_summary: &str,
        task_desc: &str,
        k: usize,
    ) -> Result<SearchOutcome> {
        if k == 0 {
            return Ok(SearchOutcome::default());
        }

        let index = self.load_index(project)?;
        if index.embedding_model != self.backend.model_name() {
            return Err(Error::ModelMismatch {
                project: project.to_string(),
                index_model: index.embedding_model,
                query_model: self.backend.model_name().to_string(),
            });
        }

        let query_text = format!("Summary: {task_summary}\nDescription: {task_desc}");
        let query = self.backend.embed_query(&query_text)?;

        let mut scored: Vec<(f32, &str)> = index
            .entries
            .iter()
            .map(|entry| (cosine_similarity(&query.vector, &entry.vector), entry.text.as_str()))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        debug!(
            project,
            k,
            candidates = index.entries.len(),
            returned = scored.len(),
            "similarity search"
        );

        Ok(SearchOutcome {
            matches: scored.into_iter().map(|(_, text)| text.to_string()).collect(),
            query_tokens: query.prompt_tokens,
        })
    }
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`; `0.0` for empty vectors or vectors of
/// different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
