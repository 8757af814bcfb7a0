//! Issue cleaning and filtering.
//!
//! Raw tracker descriptions carry markup that is useless to an embedding
//! model: user-mention tokens, attachment references, and inline image
//! references. [`clean_description`] strips them with pattern substitution;
//! unmatched text passes through unchanged.
//!
//! [`preprocess_issues`] turns a raw issue list into a trainable corpus:
//! records with no description or a disallowed issue type are dropped
//! first (cleaning records that would be discarded anyway is wasted work),
//! then cleaning runs and records whose cleaned description is too short
//! are dropped. Length is always measured on the *cleaned* text. The whole
//! operation is a pure function of its inputs.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::models::{Issue, ProcessedIssue};

/// Issue types that survive preprocessing.
pub const VALID_ISSUE_TYPES: [&str; 2] = ["Task", "Bug"];

// User-mention tokens, e.g. [~accountid:5b10a2844c20165700ede21g]
static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[~accountid:[^\]]+\]").unwrap());
// File attachment references, e.g. [^design.pdf]
static ATTACHMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\^.*?\]").unwrap());
// Inline image references, e.g. !image-2023-01-01.png|width=111,height=111!
static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!image.*?!").unwrap());

/// Strip tracker-specific non-prose tokens from a description.
///
/// Never fails; text without any markup comes back unchanged (modulo
/// surrounding whitespace).
pub fn clean_description(description: &str) -> String {
    let cleaned = MENTION_RE.replace_all(description, "");
    let cleaned = ATTACHMENT_RE.replace_all(&cleaned, "");
    let cleaned = IMAGE_RE.replace_all(&cleaned, "");
    cleaned.trim().to_string()
}

/// Filter and clean raw issues into a corpus ready for embedding.
///
/// Keeps only issues that have a description, whose `issuetype` is in
/// [`VALID_ISSUE_TYPES`], and whose cleaned description is at least
/// `length_threshold` characters long. The filtering is a one-way
/// projection: applying it again to its own output is a no-op.
pub fn preprocess_issues(issues: &[Issue], length_threshold: usize) -> Vec<ProcessedIssue> {
    let processed: Vec<ProcessedIssue> = issues
        .iter()
        .filter(|issue| issue.description.is_some())
        .filter(|issue| VALID_ISSUE_TYPES.contains(&issue.issuetype.as_str()))
        .map(|issue| {
            let description = issue.description.as_deref().unwrap_or_default();
            let description_cleaned = clean_description(description);
            let description_len = description_cleaned.chars().count();
            ProcessedIssue {
                issue: issue.clone(),
                description_cleaned,
                description_len,
            }
        })
        .filter(|p| p.description_len >= length_threshold)
        .collect();

    debug!(
        input = issues.len(),
        kept = processed.len(),
        threshold = length_threshold,
        "preprocessed issues"
    );
    processed
}
