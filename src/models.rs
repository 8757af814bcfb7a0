//! Core data models used throughout Ticket Harness.
//!
//! These types represent the issues, documents, and usage figures that flow
//! through the preprocessing, embedding, and retrieval pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Fields every record must carry before it may enter the pipeline.
pub const MANDATORY_FIELDS: [&str; 5] = ["key", "project", "summary", "description", "issuetype"];

/// A flat work-item record fetched from the issue tracker.
///
/// `key` is the tracker's stable, globally unique identifier within the
/// project's issue set. Tracker-specific extra fields are preserved
/// verbatim in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub key: String,
    pub project: String,
    pub summary: String,
    pub description: Option<String>,
    pub issuetype: String,
    #[serde(flatten, default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Issue {
    /// Check that all mandatory fields are present and non-empty.
    ///
    /// Used on the import path, where records arrive from outside the
    /// tracker client and nothing has validated their shape yet.
    pub fn validate(&self) -> Result<()> {
        let missing = if self.key.is_empty() {
            Some("key")
        } else if self.project.is_empty() {
            Some("project")
        } else if self.summary.is_empty() {
            Some("summary")
        } else if self.description.is_none() {
            Some("description")
        } else if self.issuetype.is_empty() {
            Some("issuetype")
        } else {
            None
        };

        match missing {
            Some(field) => Err(Error::InvalidIssue {
                key: if self.key.is_empty() {
                    "<unknown>".to_string()
                } else {
                    self.key.clone()
                },
                field,
            }),
            None => Ok(()),
        }
    }
}

/// An [`Issue`] that survived preprocessing.
///
/// Carries the cleaned description and its length alongside the original
/// record. Produced only by [`crate::preprocess::preprocess_issues`]; the
/// projection is one-way (records filtered out are gone).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedIssue {
    pub issue: Issue,
    pub description_cleaned: String,
    pub description_len: usize,
}

/// Metadata attached to every embeddable document and each of its chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMetadata {
    pub project: String,
    pub key: String,
}

/// A unit of embeddable text derived from one issue.
///
/// A single issue yields one document, which chunking may split into
/// several; every chunk keeps the source document's metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub page_content: String,
    pub metadata: DocMetadata,
}

/// Token counts reported by a backend call, for cost accounting upstream.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Accumulate another usage report into this one.
    pub fn absorb(&mut self, other: TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(key: &str) -> Issue {
        Issue {
            key: key.to_string(),
            project: "DEMO".to_string(),
            summary: "Add login page".to_string(),
            description: Some("Implement the login form".to_string()),
            issuetype: "Task".to_string(),
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(issue("DEMO-1").validate().is_ok());
    }

    #[test]
    fn test_validate_missing_description() {
        let mut i = issue("DEMO-2");
        i.description = None;
        let err = i.validate().unwrap_err();
        assert!(err.to_string().contains("description"));
    }

    #[test]
    fn test_validate_missing_key() {
        let err = issue("").validate().unwrap_err();
        assert!(err.to_string().contains("key"));
    }

    #[test]
    fn test_extra_fields_roundtrip() {
        let json = r#"{
            "key": "DEMO-3",
            "project": "DEMO",
            "summary": "s",
            "description": "d",
            "issuetype": "Bug",
            "priority": "High"
        }"#;
        let i: Issue = serde_json::from_str(json).unwrap();
        assert_eq!(i.extra["priority"], "High");
        let back = serde_json::to_value(&i).unwrap();
        assert_eq!(back["priority"], "High");
    }

    #[test]
    fn test_usage_absorb() {
        let mut a = TokenUsage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        };
        a.absorb(TokenUsage {
            prompt_tokens: 1,
            completion_tokens: 2,
            total_tokens: 3,
        });
        assert_eq!(a.total_tokens, 18);
    }
}
