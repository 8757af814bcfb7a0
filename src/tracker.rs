//! Issue-tracker backend contract.
//!
//! The tracker is an external collaborator: pagination, authentication,
//! and the wire format are its own business. The pipeline consumes only
//! the logical contract below — a fully materialized list of raw records
//! per project, and a normalization step into the flat [`Issue`] shape.

use std::sync::Arc;

use crate::error::Result;
use crate::models::Issue;
use crate::registry::Registry;

/// A pluggable issue-tracker client, selected by a string discriminator
/// (e.g. `"jira"`).
pub trait IssueTracker: Send + Sync {
    /// The backend discriminator used at registration time.
    fn kind(&self) -> &str;

    /// Fetch every raw issue record for a project.
    ///
    /// The returned values are tracker-native JSON; batching across the
    /// tracker's page limit happens inside the implementation.
    fn get_issues_by_project(&self, project: &str) -> Result<Vec<serde_json::Value>>;

    /// Normalize raw records into flat [`Issue`]s.
    fn format_issues(&self, raw: &[serde_json::Value]) -> Result<Vec<Issue>>;
}

/// Registry of tracker clients, keyed by kind.
pub type TrackerRegistry = Registry<Arc<dyn IssueTracker>>;

/// Create an empty tracker registry.
pub fn tracker_registry() -> TrackerRegistry {
    Registry::new("tracker")
}

/// Fetch and normalize a project's issues in one call.
pub fn fetch_project_issues(tracker: &dyn IssueTracker, project: &str) -> Result<Vec<Issue>> {
    let raw = tracker.get_issues_by_project(project)?;
    tracker.format_issues(&raw)
}
