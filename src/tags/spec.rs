//! Substitution specs
//!
//! A spec maps tag names to value templates. Entries are applied in
//! insertion order, so later templates observe the values earlier entries
//! already wrote.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::RunError;

/// Ordered tag-name to template mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnonymizationSpec {
    entries: IndexMap<String, String>,
}

impl Default for AnonymizationSpec {
    /// Blanket `anon` substitution for the three direct identifiers.
    fn default() -> Self {
        let mut entries = IndexMap::new();
        entries.insert("PatientName".to_string(), "anon".to_string());
        entries.insert("PatientID".to_string(), "anon".to_string());
        entries.insert("AccessionNumber".to_string(), "anon".to_string());
        Self { entries }
    }
}

impl AnonymizationSpec {
    /// Spec with no entries; analysis over it processes records untouched.
    pub fn empty() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Parse a spec from inline JSON, keeping document order.
    pub fn from_json(json: &str) -> Result<Self, RunError> {
        serde_json::from_str(json).map_err(|e| RunError::SpecParse {
            reason: e.to_string(),
        })
    }

    /// Load a spec from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, RunError> {
        let raw = fs::read_to_string(path).map_err(|e| RunError::SpecParse {
            reason: format!("{}: {}", path.display(), e),
        })?;
        Self::from_json(&raw)
    }

    /// Append or overwrite one entry, preserving first-insertion position.
    pub fn insert(&mut self, tag: impl Into<String>, template: impl Into<String>) {
        self.entries.insert(tag.into(), template.into());
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, String> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
