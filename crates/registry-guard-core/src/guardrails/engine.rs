//! The guardrail engine: audit entries in, guardrail report out.
//!
//! Classification is strict and non-configurable:
//! 1. A field that fails its rule is REJECTED
//! 2. Else a field on the mandatory-review list needs HUMAN REVIEW
//! 3. Else the field is APPROVED

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::audit::AuditEntry;
use crate::catalog::{self, FieldSpec, RuleId, SchemaViolation};
use crate::record::ExtractedRecord;
use crate::report::GuardrailReport;

use super::rules::{StagingConfirmation, EMPTY_BEATS_WRONG_REASON};

/// Where a verdict lands in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Rejected,
    HumanReview,
    Approved,
}

/// Guardrail decision for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardrailVerdict {
    pub field_key: String,

    pub value: Option<String>,

    pub passed: bool,

    /// Human-readable explanation, citing the rule on rejection
    pub reason: String,

    pub requires_human_review: bool,

    /// Rule that rejected the value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violated_rule: Option<RuleId>,
}

impl GuardrailVerdict {
    pub fn disposition(&self) -> Disposition {
        if !self.passed {
            Disposition::Rejected
        } else if self.requires_human_review {
            Disposition::HumanReview
        } else {
            Disposition::Approved
        }
    }
}

/// Applies the guardrail rules to an audit trail.
///
/// The engine holds only the caller-supplied staging confirmations for the
/// patient being evaluated; it has no other state and never blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardrailEngine {
    staging: StagingConfirmation,
}

impl GuardrailEngine {
    pub fn new(staging: StagingConfirmation) -> Self {
        Self { staging }
    }

    /// Evaluate every audit entry and partition the verdicts.
    ///
    /// # Arguments
    ///
    /// * `record` - The extracted record the entries were built from
    /// * `entries` - Exactly one audit entry per catalog field
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaViolation`] when the record or the entries break the
    /// catalog contract: unknown fields, missing or duplicate entries, or an
    /// entry whose value disagrees with the record. Policy violations are
    /// never errors.
    pub fn apply(
        &self,
        record: &ExtractedRecord,
        entries: &[AuditEntry],
    ) -> Result<GuardrailReport, SchemaViolation> {
        record.validate()?;

        let mut seen = HashSet::with_capacity(entries.len());
        let mut verdicts = Vec::with_capacity(entries.len());

        for entry in entries {
            let spec = catalog::lookup(&entry.field_key)?;

            if !seen.insert(spec.key) {
                return Err(SchemaViolation::DuplicateEntry(spec.key.to_string()));
            }

            let recorded = record
                .section(spec.section)
                .get(spec.name)
                .and_then(|v| v.as_deref());
            if recorded != entry.value.as_deref() {
                return Err(SchemaViolation::EntryMismatch(spec.key.to_string()));
            }

            verdicts.push(self.evaluate_entry(spec, entry));
        }

        if let Some(missing) = catalog::fields().iter().find(|f| !seen.contains(f.key)) {
            return Err(SchemaViolation::MissingEntry(missing.key.to_string()));
        }

        let report = GuardrailReport::from_verdicts(record.patient_id.clone(), verdicts);

        tracing::info!(
            patient_id = %report.patient_id,
            approved = report.summary.approved,
            rejected = report.summary.rejected,
            human_review = report.summary.human_review_required,
            "Guardrails applied"
        );

        Ok(report)
    }

    /// Evaluate a single entry against its catalog rule and review policies.
    pub fn evaluate_entry(&self, spec: &FieldSpec, entry: &AuditEntry) -> GuardrailVerdict {
        let value = entry.value.as_deref();
        let mut outcome =
            spec.guardrail
                .evaluate(value, &entry.source_document_category, self.staging);

        if spec.empty_beats_wrong && value.is_none() {
            outcome.reason = EMPTY_BEATS_WRONG_REASON.to_string();
        }

        let verdict = GuardrailVerdict {
            field_key: spec.key.to_string(),
            value: entry.value.clone(),
            passed: outcome.passed,
            reason: outcome.reason,
            requires_human_review: spec.mandatory_review,
            violated_rule: outcome.violated_rule,
        };

        match verdict.disposition() {
            Disposition::Rejected => tracing::debug!(
                field = %verdict.field_key,
                guardrail = spec.guardrail.name(),
                reason = %verdict.reason,
                "Field rejected"
            ),
            Disposition::HumanReview => {
                tracing::debug!(field = %verdict.field_key, "Field routed to human review")
            }
            Disposition::Approved => {}
        }

        verdict
    }
}
