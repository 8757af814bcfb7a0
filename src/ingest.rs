//! Issue fetch/save service — the pipeline's first persistence boundary.
//!
//! Fetches fully materialized issue lists from a tracker backend, persists
//! the raw and preprocessed corpora per project under
//! `<root>/issues/<tracker_kind>/`, and keeps the artifact metadata
//! sidecar current. Also supports importing an already-materialized issue
//! list (no tracker round-trip), with mandatory-field validation.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::Result;
use crate::metadata::{ArtifactUpdate, MetaStore};
use crate::models::{Issue, ProcessedIssue};
use crate::preprocess::preprocess_issues;
use crate::tracker::{fetch_project_issues, IssueTracker};

/// Service tying a tracker backend to one on-disk issue datastore.
pub struct IssueService {
    tracker: Arc<dyn IssueTracker>,
    dir: PathBuf,
}

impl IssueService {
    /// Create a service rooted at `<datastore root>/issues/<tracker kind>`.
    pub fn new(datastore_root: &std::path::Path, tracker: Arc<dyn IssueTracker>) -> Self {
        let dir = datastore_root.join("issues").join(tracker.kind());
        Self { tracker, dir }
    }

    /// Metadata store for this tracker's issue domain.
    pub fn meta(&self) -> MetaStore {
        MetaStore::new(&self.dir)
    }

    fn issues_path(&self, project: &str) -> PathBuf {
        self.dir.join(format!("{project}_issues.json"))
    }

    fn processed_path(&self, project: &str) -> PathBuf {
        self.dir.join(format!("{project}_issues_processed.json"))
    }

    /// Fetch and normalize issues for each project from the tracker.
    pub fn fetch_issues(&self, projects: &[String]) -> Result<BTreeMap<String, Vec<Issue>>> {
        let mut by_project = BTreeMap::new();
        for project in projects {
            let issues = fetch_project_issues(self.tracker.as_ref(), project)?;
            debug!(project, count = issues.len(), "fetched issues");
            by_project.insert(project.clone(), issues);
        }
        Ok(by_project)
    }

    /// Persist raw and preprocessed issues for each project, then update
    /// the metadata sidecar with counts and the processed-file location.
    pub fn save_issues(
        &self,
        by_project: &BTreeMap<String, Vec<Issue>>,
        length_threshold: usize,
    ) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let meta = self.meta();

        for (project, issues) in by_project {
            let issues_path = self.issues_path(project);
            let file = std::fs::File::create(&issues_path)?;
            serde_json::to_writer(file, issues)?;

            let processed = preprocess_issues(issues, length_threshold);
            let processed_path = self.processed_path(project);
            let file = std::fs::File::create(&processed_path)?;
            serde_json::to_writer(file, &processed)?;

            meta.upsert(
                project,
                ArtifactUpdate {
                    issue_count: Some(issues.len()),
                    issue_count_after_preprocess: Some(processed.len()),
                    processed_issues_path: Some(processed_path),
                    ..ArtifactUpdate::default()
                },
            )?;

            info!(
                project,
                fetched = issues.len(),
                kept = processed.len(),
                "saved issues"
            );
        }
        Ok(())
    }

    /// Persist an externally supplied issue list for one project.
    ///
    /// Every record is validated for the mandatory fields before anything
    /// is written; the storage path is identical to [`save_issues`].
    ///
    /// [`save_issues`]: IssueService::save_issues
    pub fn import_issues(
        &self,
        project: &str,
        issues: Vec<Issue>,
        length_threshold: usize,
    ) -> Result<()> {
        for issue in &issues {
            issue.validate()?;
        }
        let mut by_project = BTreeMap::new();
        by_project.insert(project.to_string(), issues);
        self.save_issues(&by_project, length_threshold)
    }

    /// Load a project's raw issues. Missing or unreadable files degrade to
    /// an empty list, matching the sidecar's best-effort read policy.
    pub fn load_issues(&self, project: &str) -> Vec<Issue> {
        let path = self.issues_path(project);
        std::fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    /// Load a project's preprocessed issues for the embedding pipeline.
    ///
    /// Unlike [`load_issues`], a missing file here is a real error: the
    /// pipeline cannot embed a corpus that was never saved.
    ///
    /// [`load_issues`]: IssueService::load_issues
    pub fn load_processed(&self, project: &str) -> Result<Vec<ProcessedIssue>> {
        let path = self.processed_path(project);
        let content = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    struct StubTracker {
        issues: Vec<Issue>,
    }

    impl IssueTracker for StubTracker {
        fn kind(&self) -> &str {
            "stub"
        }

        fn get_issues_by_project(&self, _project: &str) -> Result<Vec<serde_json::Value>> {
            self.issues
                .iter()
                .map(|i| Ok(serde_json::to_value(i)?))
                .collect()
        }

        fn format_issues(&self, raw: &[serde_json::Value]) -> Result<Vec<Issue>> {
            raw.iter()
                .map(|v| Ok(serde_json::from_value(v.clone())?))
                .collect()
        }
    }

    fn issue(key: &str, issuetype: &str, description: &str) -> Issue {
        Issue {
            key: key.to_string(),
            project: "DEMO".to_string(),
            summary: format!("Summary {key}"),
            description: Some(description.to_string()),
            issuetype: issuetype.to_string(),
            extra: BTreeMap::new(),
        }
    }

    fn service(tmp: &tempfile::TempDir, issues: Vec<Issue>) -> IssueService {
        IssueService::new(tmp.path(), Arc::new(StubTracker { issues }))
    }

    #[test]
    fn test_fetch_save_load_roundtrip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let long = "d".repeat(150);
        let svc = service(
            &tmp,
            vec![issue("DEMO-1", "Task", &long), issue("DEMO-2", "Epic", &long)],
        );

        let fetched = svc.fetch_issues(&["DEMO".to_string()]).unwrap();
        svc.save_issues(&fetched, 100).unwrap();

        assert_eq!(svc.load_issues("DEMO").len(), 2);
        // Epic is filtered out by the preprocessing allow-set.
        let processed = svc.load_processed("DEMO").unwrap();
        assert_eq!(processed.len(), 1);
        assert_eq!(processed[0].issue.key, "DEMO-1");

        let meta = svc.meta().list().unwrap();
        assert_eq!(meta[0].1.issue_count, Some(2));
        assert_eq!(meta[0].1.issue_count_after_preprocess, Some(1));
        assert!(meta[0].1.processed_issues_path.is_some());
    }

    #[test]
    fn test_import_rejects_invalid_issue() {
        let tmp = tempfile::TempDir::new().unwrap();
        let svc = service(&tmp, Vec::new());

        let mut bad = issue("DEMO-1", "Task", "fine");
        bad.summary = String::new();
        let err = svc.import_issues("DEMO", vec![bad], 100).unwrap_err();
        assert!(matches!(err, Error::InvalidIssue { .. }));
        // Nothing was written.
        assert!(svc.load_issues("DEMO").is_empty());
    }

    #[test]
    fn test_load_issues_degrades_to_empty() {
        let tmp = tempfile::TempDir::new().unwrap();
        let svc = service(&tmp, Vec::new());
        assert!(svc.load_issues("NOPE").is_empty());
    }

    #[test]
    fn test_load_processed_missing_is_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let svc = service(&tmp, Vec::new());
        assert!(svc.load_processed("NOPE").is_err());
    }
}
