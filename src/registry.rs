//! Generic string-keyed backend registry.
//!
//! The same plugin seam is used four times — issue-tracker clients,
//! embedding backends, vector stores, and generation backends — so instead
//! of four hand-written near-identical registries there is one generic
//! [`Registry`] parameterized over the backend type.
//!
//! Registries are independent (no shared state) and are populated once at
//! process start; nothing is ever unregistered.
//!
//! # Example
//!
//! ```rust
//! use ticket_harness::registry::Registry;
//!
//! let mut registry: Registry<u32> = Registry::new("demo");
//! registry.register("alpha", 1);
//! assert_eq!(*registry.get("alpha").unwrap(), 1);
//! assert!(registry.get("beta").is_err());
//! ```

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Maps a string discriminator to a backend implementation.
pub struct Registry<T> {
    family: &'static str,
    entries: BTreeMap<String, T>,
}

impl<T> Registry<T> {
    /// Create an empty registry. `family` names the backend family in
    /// lookup errors (e.g. `"embedding"`, `"tracker"`).
    pub fn new(family: &'static str) -> Self {
        Self {
            family,
            entries: BTreeMap::new(),
        }
    }

    /// Register a backend under `kind`, replacing any previous entry.
    pub fn register(&mut self, kind: impl Into<String>, backend: T) {
        self.entries.insert(kind.into(), backend);
    }

    /// Look up a backend by kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRegistered`] listing the currently known kinds
    /// when `kind` has not been registered.
    pub fn get(&self, kind: &str) -> Result<&T> {
        self.entries.get(kind).ok_or_else(|| Error::NotRegistered {
            family: self.family,
            kind: kind.to_string(),
            known: self.kinds().iter().map(|k| k.to_string()).collect(),
        })
    }

    /// All registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the count of registered backends.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
