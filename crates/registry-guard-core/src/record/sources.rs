//! Per-section source-document categories supplied by the caller.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::catalog::Section;

use super::RecordError;

/// Source-document category per section.
///
/// Sections without an explicit entry fall back to the catalog's canonical
/// category. Deserializes from a map of section name to category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceMap(BTreeMap<Section, String>);

impl SourceMap {
    /// A map that uses the canonical category for every section.
    pub fn canonical() -> Self {
        Self::default()
    }

    /// Override the category for one section.
    pub fn with(mut self, section: Section, category: impl Into<String>) -> Self {
        self.set(section, category);
        self
    }

    pub fn set(&mut self, section: Section, category: impl Into<String>) {
        self.0.insert(section, category.into());
    }

    /// Category for a section, falling back to the canonical one.
    pub fn get(&self, section: Section) -> &str {
        self.0
            .get(&section)
            .map(String::as_str)
            .unwrap_or_else(|| section.canonical_source())
    }

    /// Parse a source map from YAML (JSON is valid YAML).
    pub fn from_yaml(yaml: &str) -> Result<Self, RecordError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }
}
