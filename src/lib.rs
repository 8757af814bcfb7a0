//! # Ticket Harness
//!
//! A retrieval pipeline for issue trackers: ingest work items, turn their
//! text into vector embeddings, persist per-project indexes, and use
//! similarity search over those indexes to ground a generative-text step
//! that drafts new issue descriptions.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌─────────────┐   ┌────────────┐
//! │ Tracker  │──▶│ Preprocess │──▶│ Chunk+Embed │──▶│ Vector     │
//! │ backend  │   │  + persist │   │  + persist  │   │ index file │
//! └──────────┘   └─────┬──────┘   └──────┬──────┘   └─────┬──────┘
//!                      │                 │                │
//!                      ▼                 ▼                ▼
//!                 ┌─────────────────────────┐   ┌──────────────────┐
//!                 │ artifact metadata store │   │ similarity search │
//!                 └─────────────────────────┘   └────────┬─────────┘
//!                                                        ▼
//!                                               ┌─────────────────┐
//!                                               │  task drafting  │
//!                                               └─────────────────┘
//! ```
//!
//! Every backend seam (tracker, embedding, vector store, generation) is a trait behind
//! the generic [`registry::Registry`], so swapping implementations is a
//! configuration change. Execution is synchronous and single-request; the
//! artifact metadata store is consulted and updated at every persistence
//! boundary, never during search. Callers running the pipeline for the
//! same project concurrently must serialize writes themselves.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`registry`] | Generic backend registry |
//! | [`preprocess`] | Issue cleaning and filtering |
//! | [`chunk`] | Character-bounded document splitting |
//! | [`tracker`] | Issue-tracker backend contract |
//! | [`embedding`] | Embedding backend abstraction |
//! | [`generation`] | Generation backend abstraction |
//! | [`index`] | Persisted vector indexes |
//! | [`metadata`] | Artifact metadata sidecar |
//! | [`ingest`] | Issue fetch/save service |
//! | [`pipeline`] | Embedding generation pipeline |
//! | [`search`] | Similarity search |
//! | [`draft`] | Retrieval-augmented drafting |

pub mod chunk;
pub mod config;
pub mod draft;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod index;
pub mod ingest;
pub mod metadata;
pub mod models;
pub mod pipeline;
pub mod preprocess;
pub mod registry;
pub mod search;
pub mod tracker;

pub use error::{Error, Result};
