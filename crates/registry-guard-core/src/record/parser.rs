//! Extracted record parsing from JSON/YAML.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::catalog::{self, SchemaViolation, Section};

use super::schema::validate_record_schema;

/// Errors that can occur when loading records.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Failed to read record file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Record does not match the extraction schema: {}", .0.join("; "))]
    SchemaError(Vec<String>),

    #[error(transparent)]
    Violation(#[from] SchemaViolation),
}

/// Field name to value for one section. `None` marks an absent value.
pub type FieldValues = BTreeMap<String, Option<String>>;

/// Structured output of the extraction service for one patient.
///
/// Every section is always present. A field omitted from a section is
/// treated as absent; a field unknown to the catalog is a schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub patient_id: String,
    pub timeline: FieldValues,
    pub staging: FieldValues,
    pub pathology: FieldValues,
    pub comorbidities: FieldValues,
    pub germline: FieldValues,
    pub medications: FieldValues,
}

impl ExtractedRecord {
    /// A record with every catalog field present and absent.
    pub fn empty(patient_id: impl Into<String>) -> Self {
        let mut record = Self {
            patient_id: patient_id.into(),
            timeline: FieldValues::new(),
            staging: FieldValues::new(),
            pathology: FieldValues::new(),
            comorbidities: FieldValues::new(),
            germline: FieldValues::new(),
            medications: FieldValues::new(),
        };

        for spec in catalog::fields() {
            record
                .section_mut(spec.section)
                .insert(spec.name.to_string(), None);
        }

        record
    }

    /// Parse a record from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse a record from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, RecordError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse a record from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse a record from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Validate a raw value against the schema, then deserialize it.
    pub fn from_value(value: serde_json::Value) -> Result<Self, RecordError> {
        validate_record_schema(&value).map_err(RecordError::SchemaError)?;
        let record: ExtractedRecord = serde_json::from_value(value)?;
        record.validate()?;
        Ok(record)
    }

    pub fn section(&self, section: Section) -> &FieldValues {
        match section {
            Section::Timeline => &self.timeline,
            Section::Staging => &self.staging,
            Section::Pathology => &self.pathology,
            Section::Comorbidities => &self.comorbidities,
            Section::Germline => &self.germline,
            Section::Medications => &self.medications,
        }
    }

    fn section_mut(&mut self, section: Section) -> &mut FieldValues {
        match section {
            Section::Timeline => &mut self.timeline,
            Section::Staging => &mut self.staging,
            Section::Pathology => &mut self.pathology,
            Section::Comorbidities => &mut self.comorbidities,
            Section::Germline => &mut self.germline,
            Section::Medications => &mut self.medications,
        }
    }

    /// Value of a field by full key, `None` when absent.
    pub fn value(&self, key: &str) -> Result<Option<&str>, SchemaViolation> {
        let spec = catalog::lookup(key)?;
        Ok(self
            .section(spec.section)
            .get(spec.name)
            .and_then(|v| v.as_deref()))
    }

    /// Set a field by full key. `None` marks the field absent.
    pub fn set(&mut self, key: &str, value: Option<&str>) -> Result<(), SchemaViolation> {
        let spec = catalog::lookup(key)?;
        if value.is_some_and(str::is_empty) {
            return Err(SchemaViolation::EmptyValue(key.to_string()));
        }
        self.section_mut(spec.section)
            .insert(spec.name.to_string(), value.map(str::to_string));
        Ok(())
    }

    /// Builder-style variant of [`ExtractedRecord::set`].
    pub fn with(mut self, key: &str, value: &str) -> Result<Self, SchemaViolation> {
        self.set(key, Some(value))?;
        Ok(self)
    }

    /// Check every field against the catalog.
    pub fn validate(&self) -> Result<(), SchemaViolation> {
        for section in Section::ALL {
            for (name, value) in self.section(section) {
                let spec = catalog::lookup_in(section, name)?;
                if value.as_deref().is_some_and(str::is_empty) {
                    return Err(SchemaViolation::EmptyValue(spec.key.to_string()));
                }
            }
        }
        Ok(())
    }

    /// Number of fields holding a value.
    pub fn populated_count(&self) -> usize {
        Section::ALL
            .iter()
            .flat_map(|s| self.section(*s).values())
            .filter(|v| v.is_some())
            .count()
    }
}
