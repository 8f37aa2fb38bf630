//! Audit trail construction.
//!
//! Every leaf field gets exactly one audit entry recording its value,
//! status, confidence, source-document category and rule reference. The
//! source category and rule reference are static provenance assertions
//! taken from the catalog and the caller's [`SourceMap`], never inferred
//! from the value itself.

use serde::{Deserialize, Serialize};

use crate::catalog::{self, SchemaViolation};
use crate::record::{ExtractedRecord, SourceMap};

/// Whether a field holds a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldStatus {
    Populated,
    Empty,
}

/// Extraction confidence recorded for a field.
///
/// The extraction service filters low-confidence output itself, so a
/// populated field is always HIGH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "N/A")]
    NotApplicable,
}

/// Provenance record for one leaf field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Full field key, e.g. `staging.t_stage`
    pub field_key: String,

    pub value: Option<String>,

    pub status: FieldStatus,

    pub confidence: Confidence,

    /// Category of the document the value was abstracted from
    pub source_document_category: String,

    /// Compliance rule governing the field
    pub rule_reference: String,
}

impl AuditEntry {
    pub fn is_populated(&self) -> bool {
        self.status == FieldStatus::Populated
    }
}

/// Completion statistics for an audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSummary {
    pub total_fields: usize,
    pub populated_count: usize,
    pub empty_count: usize,

    /// Populated share as a percentage with one decimal place, e.g. `"83.9%"`
    pub completion_rate: String,
}

impl CompletionSummary {
    pub fn from_entries(entries: &[AuditEntry]) -> Self {
        let total_fields = entries.len();
        let populated_count = entries.iter().filter(|e| e.is_populated()).count();
        let empty_count = total_fields - populated_count;

        let rate = if total_fields == 0 {
            0.0
        } else {
            populated_count as f64 / total_fields as f64 * 100.0
        };

        Self {
            total_fields,
            populated_count,
            empty_count,
            completion_rate: format!("{:.1}%", rate),
        }
    }
}

/// Ordered audit entries for one run, plus completion statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrail {
    pub entries: Vec<AuditEntry>,
    pub summary: CompletionSummary,
}

/// Builds the audit trail for an extracted record.
#[derive(Debug, Clone, Default)]
pub struct AuditTrailBuilder {
    sources: SourceMap,
}

impl AuditTrailBuilder {
    /// A builder using the canonical source category for every section.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use caller-supplied source categories.
    pub fn with_sources(sources: SourceMap) -> Self {
        Self { sources }
    }

    /// Build one entry per catalog field, in form order.
    ///
    /// Fails only when the record itself violates the catalog.
    pub fn build(&self, record: &ExtractedRecord) -> Result<AuditTrail, SchemaViolation> {
        record.validate()?;

        let entries: Vec<AuditEntry> = catalog::fields()
            .iter()
            .map(|spec| {
                let value = record
                    .section(spec.section)
                    .get(spec.name)
                    .cloned()
                    .flatten();

                let (status, confidence) = match value {
                    Some(_) => (FieldStatus::Populated, Confidence::High),
                    None => (FieldStatus::Empty, Confidence::NotApplicable),
                };

                AuditEntry {
                    field_key: spec.key.to_string(),
                    value,
                    status,
                    confidence,
                    source_document_category: self.sources.get(spec.section).to_string(),
                    rule_reference: spec.rule_reference(),
                }
            })
            .collect();

        let summary = CompletionSummary::from_entries(&entries);
        tracing::debug!(
            patient_id = %record.patient_id,
            populated = summary.populated_count,
            empty = summary.empty_count,
            "Audit trail built"
        );

        Ok(AuditTrail { entries, summary })
    }
}
