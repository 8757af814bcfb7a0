//! Embedding generation pipeline — the second persistence boundary.
//!
//! Composes document loading, chunking, and embedding into one flow:
//!
//! ```text
//! ProcessedIssue ──▶ load_documents ──▶ split_documents ──▶ embed_documents
//!                                                              │
//!                                          index file + metadata upsert
//! ```
//!
//! Each run builds the project's index from scratch and overwrites the
//! previous file wholesale; there is no incremental update, and staleness
//! is tracked through the metadata sidecar's `updated_at` plus the corpus
//! fingerprint recorded inside the index. Backend errors propagate to the
//! caller unmodified — no retry happens here.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::chunk::split_documents;
use crate::embedding::EmbeddingBackend;
use crate::error::Result;
use crate::index::{index_path, VectorIndex};
use crate::metadata::{ArtifactUpdate, MetaStore};
use crate::models::{Document, DocMetadata, ProcessedIssue, TokenUsage};

/// Pipeline tying an embedding backend to one on-disk embeddings root.
pub struct EmbeddingPipeline {
    backend: Arc<dyn EmbeddingBackend>,
    embeddings_root: PathBuf,
}

impl EmbeddingPipeline {
    /// Create a pipeline rooted at `<datastore root>/embeddings`.
    pub fn new(datastore_root: &Path, backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self {
            backend,
            embeddings_root: datastore_root.join("embeddings"),
        }
    }

    /// Root directory under which this pipeline persists indexes.
    pub fn embeddings_root(&self) -> &Path {
        &self.embeddings_root
    }

    /// Metadata store for this backend's embedding domain.
    pub fn meta(&self) -> MetaStore {
        MetaStore::new(&self.embeddings_root.join(self.backend.kind()))
    }

    /// Deterministic index location for `project` under this pipeline.
    pub fn index_location(&self, project: &str) -> PathBuf {
        index_path(
            &self.embeddings_root,
            self.backend.kind(),
            project,
            self.backend.model_name(),
        )
    }

    /// Map each surviving issue to one embeddable document.
    ///
    /// Content is the `summary:`/`description:` pair the index stores as
    /// exhibit text; metadata carries the project and issue key.
    pub fn load_documents(&self, project: &str, processed: &[ProcessedIssue]) -> Vec<Document> {
        processed
            .iter()
            .map(|p| Document {
                page_content: format!(
                    "summary: {}\ndescription: {}",
                    p.issue.summary, p.description_cleaned
                ),
                metadata: DocMetadata {
                    project: project.to_string(),
                    key: p.issue.key.clone(),
                },
            })
            .collect()
    }

    /// Split documents to the backend's input budget. Chunk metadata is
    /// preserved; see [`crate::chunk::split_documents`].
    pub fn split_documents(&self, documents: &[Document], chunk_size: usize) -> Vec<Document> {
        split_documents(documents, chunk_size)
    }

    /// Vectorize every chunk and persist the project's index, overwriting
    /// any previous one, then record the index location in the metadata
    /// sidecar. Returns the index location and the backend's usage report.
    pub fn embed_documents(
        &self,
        project: &str,
        documents: &[Document],
    ) -> Result<(PathBuf, TokenUsage)> {
        let texts: Vec<String> = documents.iter().map(|d| d.page_content.clone()).collect();
        let (vectors, usage) = self.backend.embed(&texts)?;

        let index = VectorIndex::build(
            self.backend.kind(),
            self.backend.model_name(),
            documents,
            vectors,
        );
        let location = self.index_location(project);
        index.save(&location)?;

        self.meta().upsert(
            project,
            ArtifactUpdate {
                index_path: Some(location.clone()),
                ..ArtifactUpdate::default()
            },
        )?;

        info!(
            project,
            chunks = documents.len(),
            tokens = usage.total_tokens,
            "generated embeddings"
        );
        Ok((location, usage))
    }

    /// Full pipeline: load, split, embed, persist.
    pub fn generate_embeddings(
        &self,
        project: &str,
        processed: &[ProcessedIssue],
        chunk_size: usize,
    ) -> Result<(PathBuf, TokenUsage)> {
        let documents = self.load_documents(project, processed);
        let chunks = self.split_documents(&documents, chunk_size);
        self.embed_documents(project, &chunks)
    }
}
