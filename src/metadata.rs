//! Artifact metadata store.
//!
//! A bookkeeping sidecar: for each `(domain, backend_kind)` directory, one
//! `_meta.json` file maps project names to an [`ArtifactRecord`] of
//! creation/update timestamps, derived-file locations, and counts.
//!
//! The store favors availability over strict correctness: a missing or
//! corrupt metadata file reads as an empty mapping, never an error. That
//! policy applies to *reads of the sidecar only* — it deliberately does
//! not extend to the vector index itself (see [`crate::search`]), where a
//! load failure means "embeddings were never generated" and must surface.
//!
//! Writes are a full-file overwrite of the sequential read→merge→write
//! pattern; concurrent writers to the same file are not coordinated and
//! must be serialized by the caller.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

/// Name of the metadata sidecar file within a datastore directory.
pub const META_FILE: &str = "_meta.json";

/// Per-project bookkeeping record.
///
/// `created_at` is set once when the project first appears and never
/// overwritten; `updated_at` advances on every write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_count_after_preprocess: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_issues_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_path: Option<PathBuf>,
}

/// Fields to merge into a project's record on upsert. `None` fields leave
/// the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ArtifactUpdate {
    pub issue_count: Option<usize>,
    pub issue_count_after_preprocess: Option<usize>,
    pub processed_issues_path: Option<PathBuf>,
    pub index_path: Option<PathBuf>,
}

/// Handle on one `(domain, backend_kind)` metadata file.
pub struct MetaStore {
    path: PathBuf,
}

impl MetaStore {
    /// Metadata store for the given datastore directory.
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(META_FILE),
        }
    }

    /// Path of the underlying metadata file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full project mapping.
    ///
    /// Degrades to an empty mapping on any read or parse failure; a
    /// corrupt sidecar must never block the pipeline.
    pub fn read(&self) -> BTreeMap<String, ArtifactRecord> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return BTreeMap::new(),
        };
        match serde_json::from_str(&content) {
            Ok(map) => map,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "metadata file unreadable, treating as empty"
                );
                BTreeMap::new()
            }
        }
    }

    /// Overwrite the metadata file with `map`.
    pub fn write(&self, map: &BTreeMap<String, ArtifactRecord>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(&self.path)?;
        serde_json::to_writer_pretty(file, map)?;
        Ok(())
    }

    /// Merge `update` into the record for `project` and persist.
    ///
    /// A new project gets `created_at = updated_at = now`; an existing one
    /// keeps its `created_at` and all fields the update leaves `None`.
    /// Returns the record as written.
    pub fn upsert(&self, project: &str, update: ArtifactUpdate) -> Result<ArtifactRecord> {
        let mut map = self.read();
        let now = Utc::now();

        let record = match map.get(project) {
            Some(existing) => ArtifactRecord {
                created_at: existing.created_at,
                updated_at: now,
                issue_count: update.issue_count.or(existing.issue_count),
                issue_count_after_preprocess: update
                    .issue_count_after_preprocess
                    .or(existing.issue_count_after_preprocess),
                processed_issues_path: update
                    .processed_issues_path
                    .or_else(|| existing.processed_issues_path.clone()),
                index_path: update.index_path.or_else(|| existing.index_path.clone()),
            },
            None => ArtifactRecord {
                created_at: now,
                updated_at: now,
                issue_count: update.issue_count,
                issue_count_after_preprocess: update.issue_count_after_preprocess,
                processed_issues_path: update.processed_issues_path,
                index_path: update.index_path,
            },
        };

        map.insert(project.to_string(), record.clone());
        self.write(&map)?;
        info!(project, path = %self.path.display(), "updated artifact metadata");
        Ok(record)
    }

    /// List all project records, sorted by project name.
    ///
    /// Returns `None` when the store was never initialized for this
    /// domain (no readable metadata file) — callers show "no data yet"
    /// rather than an error. An initialized store with zero projects
    /// returns `Some` of an empty list.
    pub fn list(&self) -> Option<Vec<(String, ArtifactRecord)>> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let map: BTreeMap<String, ArtifactRecord> = serde_json::from_str(&content).ok()?;
        Some(map.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_missing_file_is_empty() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = MetaStore::new(tmp.path());
        assert!(store.read().is_empty());
    }

    #[test]
    fn test_read_corrupt_file_is_empty() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = MetaStore::new(tmp.path());
        std::fs::write(store.path(), "{not valid json!").unwrap();
        assert!(store.read().is_empty());
    }

    #[test]
    fn test_list_uninitialized_is_none() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = MetaStore::new(tmp.path());
        assert!(store.list().is_none());
    }

    #[test]
    fn test_list_after_write_contains_project() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = MetaStore::new(tmp.path());
        store
            .upsert(
                "DEMO",
                ArtifactUpdate {
                    issue_count: Some(12),
                    ..ArtifactUpdate::default()
                },
            )
            .unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].0, "DEMO");
        assert_eq!(listed[0].1.issue_count, Some(12));
    }

    #[test]
    fn test_upsert_merges_fields() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = MetaStore::new(tmp.path());

        let first = store
            .upsert(
                "DEMO",
                ArtifactUpdate {
                    issue_count: Some(10),
                    ..ArtifactUpdate::default()
                },
            )
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = store
            .upsert(
                "DEMO",
                ArtifactUpdate {
                    index_path: Some(PathBuf::from("/idx/DEMO.json")),
                    ..ArtifactUpdate::default()
                },
            )
            .unwrap();

        // Both writes are visible, created_at unchanged, updated_at advanced.
        assert_eq!(second.issue_count, Some(10));
        assert_eq!(second.index_path, Some(PathBuf::from("/idx/DEMO.json")));
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at > first.updated_at);
    }

    #[test]
    fn test_new_project_created_equals_updated() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = MetaStore::new(tmp.path());
        let record = store.upsert("NEW", ArtifactUpdate::default()).unwrap();
        assert_eq!(record.created_at, record.updated_at);
    }

    #[test]
    fn test_upsert_does_not_touch_other_projects() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = MetaStore::new(tmp.path());
        store
            .upsert(
                "A",
                ArtifactUpdate {
                    issue_count: Some(1),
                    ..ArtifactUpdate::default()
                },
            )
            .unwrap();
        store
            .upsert(
                "B",
                ArtifactUpdate {
                    issue_count: Some(2),
                    ..ArtifactUpdate::default()
                },
            )
            .unwrap();

        let map = store.read();
        assert_eq!(map["A"].issue_count, Some(1));
        assert_eq!(map["B"].issue_count, Some(2));
    }
}
