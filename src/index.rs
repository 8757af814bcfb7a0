//! Persisted vector index: layout, save, and load.
//!
//! One index file exists per `(backend_kind, project, embedding_model)`
//! triple, at a deterministic path under the embeddings root:
//!
//! ```text
//! <embeddings root>/<backend_kind>/index_<project>_<model>.json
//! ```
//!
//! The file is self-describing: it records the backend kind, the embedding
//! model, the vector dimensionality, and a SHA-256 fingerprint of the
//! chunk texts it was built from. The model tag lets similarity search
//! reject a mismatched query model; the fingerprint answers "is this index
//! stale relative to the current corpus" without re-embedding anything.
//!
//! An index is created or overwritten wholesale on each generation run and
//! is never partially mutated. Only the pipeline that built it writes it;
//! everyone else reads.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::Document;

/// One embedded chunk: its text, source metadata, and vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub text: String,
    pub project: String,
    pub key: String,
    pub vector: Vec<f32>,
}

/// A project's persisted vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    pub backend_kind: String,
    pub embedding_model: String,
    pub dims: usize,
    pub fingerprint: String,
    pub built_at: DateTime<Utc>,
    pub entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Assemble an index from chunks and their vectors, in matching order.
    pub fn build(
        backend_kind: &str,
        embedding_model: &str,
        documents: &[Document],
        vectors: Vec<Vec<f32>>,
    ) -> Self {
        debug_assert_eq!(documents.len(), vectors.len());
        let dims = vectors.first().map(Vec::len).unwrap_or(0);
        let fingerprint = corpus_fingerprint(documents.iter().map(|d| d.page_content.as_str()));
        let entries = documents
            .iter()
            .zip(vectors)
            .map(|(doc, vector)| IndexEntry {
                text: doc.page_content.clone(),
                project: doc.metadata.project.clone(),
                key: doc.metadata.key.clone(),
                vector,
            })
            .collect();

        Self {
            backend_kind: backend_kind.to_string(),
            embedding_model: embedding_model.to_string(),
            dims,
            fingerprint,
            built_at: Utc::now(),
            entries,
        }
    }

    /// Write the index to `path`, overwriting any previous file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        serde_json::to_writer(file, self)?;
        info!(
            path = %path.display(),
            entries = self.entries.len(),
            model = %self.embedding_model,
            "saved vector index"
        );
        Ok(())
    }

    /// Load the index for `project` from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexNotFound`] when no file exists at `path` —
    /// the signal that embeddings were never generated for this project.
    /// A file that exists but cannot be parsed surfaces as a parse error;
    /// an index that exists but has zero entries loads fine.
    pub fn load(project: &str, path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::IndexNotFound {
                project: project.to_string(),
                path: path.to_path_buf(),
            });
        }
        let file = std::fs::File::open(path)?;
        let index: VectorIndex = serde_json::from_reader(std::io::BufReader::new(file))?;
        debug!(
            path = %path.display(),
            entries = index.entries.len(),
            "loaded vector index"
        );
        Ok(index)
    }
}

/// Deterministic path of a project's index under the embeddings root.
pub fn index_path(root: &Path, backend_kind: &str, project: &str, model: &str) -> PathBuf {
    root.join(backend_kind)
        .join(format!("index_{project}_{model}.json"))
}

/// SHA-256 fingerprint over an ordered sequence of chunk texts.
pub fn corpus_fingerprint<'a>(texts: impl Iterator<Item = &'a str>) -> String {
    let mut hasher = Sha256::new();
    for text in texts {
        hasher.update(text.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocMetadata;

    fn docs() -> Vec<Document> {
        ["first chunk", "second chunk"]
            .iter()
            .enumerate()
            .map(|(i, text)| Document {
                page_content: text.to_string(),
                metadata: DocMetadata {
                    project: "DEMO".to_string(),
                    key: format!("DEMO-{i}"),
                },
            })
            .collect()
    }

    #[test]
    fn test_index_path_is_deterministic() {
        let root = Path::new("/data/embeddings");
        let p = index_path(root, "openai", "DEMO", "text-embedding-ada-002");
        assert_eq!(
            p,
            PathBuf::from("/data/embeddings/openai/index_DEMO_text-embedding-ada-002.json")
        );
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = index_path(tmp.path(), "openai", "DEMO", "model-x");

        let index = VectorIndex::build(
            "openai",
            "model-x",
            &docs(),
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        );
        index.save(&path).unwrap();

        let loaded = VectorIndex::load("DEMO", &path).unwrap();
        assert_eq!(loaded.embedding_model, "model-x");
        assert_eq!(loaded.dims, 2);
        assert_eq!(loaded.entries.len(), 2);
        assert_eq!(loaded.entries[0].key, "DEMO-0");
        assert_eq!(loaded.fingerprint, index.fingerprint);
    }

    #[test]
    fn test_load_missing_index_is_not_found() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = index_path(tmp.path(), "openai", "DEMO", "model-x");
        let err = VectorIndex::load("DEMO", &path).unwrap_err();
        assert!(matches!(err, Error::IndexNotFound { .. }));
    }

    #[test]
    fn test_save_overwrites_previous_index() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = index_path(tmp.path(), "openai", "DEMO", "model-x");

        VectorIndex::build("openai", "model-x", &docs(), vec![vec![1.0], vec![2.0]])
            .save(&path)
            .unwrap();
        VectorIndex::build("openai", "model-x", &docs()[..1].to_vec(), vec![vec![3.0]])
            .save(&path)
            .unwrap();

        let loaded = VectorIndex::load("DEMO", &path).unwrap();
        assert_eq!(loaded.entries.len(), 1);
        assert_eq!(loaded.entries[0].vector, vec![3.0]);
    }

    #[test]
    fn test_fingerprint_changes_with_corpus() {
        let a = corpus_fingerprint(["alpha", "beta"].into_iter());
        let b = corpus_fingerprint(["alpha", "gamma"].into_iter());
        let c = corpus_fingerprint(["alpha", "beta"].into_iter());
        assert_ne!(a, b);
        assert_eq!(a, c);
    }
}
