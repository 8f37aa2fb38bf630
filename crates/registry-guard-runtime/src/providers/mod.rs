//! Extraction service abstractions.
//!
//! An extractor turns a patient's raw documents into an
//! [`ExtractedRecord`]. Extractors produce data, never decisions: every
//! record they return still goes through the audit trail and guardrails.
//!
//! ## Security
//!
//! Remote extractors use the [`secrets`] module for credential handling.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use registry_guard_core::{ExtractedRecord, RecordError};

use crate::documents::PatientDocuments;

mod fixture;
pub mod secrets;

#[cfg(feature = "http")]
mod http;

pub use fixture::FixtureExtractor;
pub use secrets::{ApiCredential, CredentialSource};

#[cfg(feature = "http")]
pub use http::HttpExtractor;

/// Errors from extractors.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Extractor not configured: {0}")]
    NotConfigured(String),

    #[error("No pre-extracted record for patient {0}")]
    FixtureMissing(String),

    #[error("Failed to read pre-extracted record: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Extraction returned an invalid record: {0}")]
    InvalidRecord(#[from] RecordError),
}

impl ExtractionError {
    /// Transient failures worth another attempt.
    ///
    /// An invalid record is a broken extraction contract and is never retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ExtractionError::HttpError(_)
            | ExtractionError::RateLimited
            | ExtractionError::Timeout(_) => true,
            ExtractionError::ApiError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Whether a record came from a live service or fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExtractionMode {
    Mock,
    Live,
}

/// Extraction service abstraction.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract a structured record from a patient's documents.
    async fn extract(&self, documents: &PatientDocuments) -> Result<ExtractedRecord, ExtractionError>;

    fn mode(&self) -> ExtractionMode;

    /// Extractor name for logs.
    fn name(&self) -> &str;
}

/// Remove markdown code fences that language models wrap JSON in.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

/// Parse raw extraction output into a record for `patient_id`.
///
/// The patient id is always taken from the caller, never from the output.
pub fn parse_extraction_output(
    patient_id: &str,
    raw: &str,
) -> Result<ExtractedRecord, ExtractionError> {
    let mut value: serde_json::Value =
        serde_json::from_str(strip_code_fences(raw)).map_err(RecordError::from)?;

    if let Some(object) = value.as_object_mut() {
        object.insert(
            "patient_id".to_string(),
            serde_json::Value::String(patient_id.to_string()),
        );
    }

    Ok(ExtractedRecord::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUT: &str = r#"{
        "timeline": {"date_of_diagnosis": "2024-02-18"},
        "staging": {"t_stage": "T2"},
        "pathology": {},
        "comorbidities": {},
        "germline": {},
        "medications": {"drugs": null}
    }"#;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("```\n{\"a\": 1}\n```\n"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  {}  "), "{}");
    }

    #[test]
    fn test_parse_output_sets_patient_id() {
        let fenced = format!("```json\n{}\n```", OUTPUT);
        let record = parse_extraction_output("patient_001", &fenced).unwrap();
        assert_eq!(record.patient_id, "patient_001");
        assert_eq!(record.value("staging.t_stage").unwrap(), Some("T2"));
    }

    #[test]
    fn test_parse_output_overrides_reported_patient_id() {
        let output = OUTPUT.replacen('{', r#"{"patient_id": "someone_else","#, 1);
        let record = parse_extraction_output("patient_001", &output).unwrap();
        assert_eq!(record.patient_id, "patient_001");
    }

    #[test]
    fn test_parse_output_rejects_invalid_json_and_schema() {
        assert!(matches!(
            parse_extraction_output("p", "not json"),
            Err(ExtractionError::InvalidRecord(_))
        ));
        assert!(matches!(
            parse_extraction_output("p", r#"{"timeline": {}}"#),
            Err(ExtractionError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ExtractionError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(ExtractionError::RateLimited.is_retryable());
        assert!(ExtractionError::ApiError { status: 503, message: "busy".into() }.is_retryable());
        assert!(!ExtractionError::ApiError { status: 400, message: "bad".into() }.is_retryable());
        assert!(!ExtractionError::FixtureMissing("p".into()).is_retryable());
        assert!(!ExtractionError::InvalidRecord(RecordError::SchemaError(vec![])).is_retryable());
    }
}
