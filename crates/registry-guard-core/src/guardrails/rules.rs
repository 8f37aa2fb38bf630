//! Guardrail rule variants.
//!
//! Each catalog field is evaluated by exactly one variant. An absent value
//! always passes: empty is never penalized.

use serde::{Deserialize, Serialize};

use crate::catalog::RuleId;

use super::patterns::{forbidden_medication_source, is_first_visit_note};

/// Reason given when no specific rule applies.
pub const DEFAULT_PASS_REASON: &str = "Passed all guardrails";

/// Reason given when a rule-governed field is absent.
pub const EMPTY_ACCEPTABLE_REASON: &str = "Field is empty; acceptable";

/// Reason written over absent high-risk fields.
pub const EMPTY_BEATS_WRONG_REASON: &str = "Field empty; safer than potentially wrong value";

/// The closed set of guardrail rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Guardrail {
    /// Comorbidities must come from the first-visit physician note
    ComorbidityProvenance,
    /// Medications must never come from pharmacy, nursing or dispensing records
    MedicationProvenance,
    /// Diagnosis date passes with a manual cross-check advisory
    DiagnosisDatePolicy,
    /// Overall stage requires imaging and physician-note confirmation
    StagingConfirmation,
    /// No specific rule
    Default,
}

/// Staging confirmations supplied by the caller for one patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagingConfirmation {
    /// Stage is confirmed by imaging
    pub imaging: bool,

    /// Stage is confirmed by a physician note
    pub physician_note: bool,
}

impl StagingConfirmation {
    pub fn new(imaging: bool, physician_note: bool) -> Self {
        Self {
            imaging,
            physician_note,
        }
    }

    /// Both confirmations present.
    pub fn confirmed() -> Self {
        Self::new(true, true)
    }
}

/// Result of evaluating a single rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub passed: bool,
    pub reason: String,

    /// Set only when the rule rejected the value
    pub violated_rule: Option<RuleId>,
}

impl RuleOutcome {
    pub fn pass(reason: impl Into<String>) -> Self {
        Self {
            passed: true,
            reason: reason.into(),
            violated_rule: None,
        }
    }

    pub fn reject(rule: RuleId, reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            reason: reason.into(),
            violated_rule: Some(rule),
        }
    }
}

impl Guardrail {
    pub fn name(&self) -> &'static str {
        match self {
            Guardrail::ComorbidityProvenance => "comorbidity_provenance",
            Guardrail::MedicationProvenance => "medication_provenance",
            Guardrail::DiagnosisDatePolicy => "diagnosis_date_policy",
            Guardrail::StagingConfirmation => "staging_confirmation",
            Guardrail::Default => "default",
        }
    }

    /// Evaluate a field value against this rule.
    ///
    /// # Arguments
    ///
    /// * `value` - The extracted value, `None` when absent
    /// * `source` - Source-document category recorded in the audit trail
    /// * `staging` - Caller-supplied staging confirmations
    pub fn evaluate(
        &self,
        value: Option<&str>,
        source: &str,
        staging: StagingConfirmation,
    ) -> RuleOutcome {
        match (self, value) {
            (Guardrail::ComorbidityProvenance, Some(_)) => comorbidity_provenance(source),
            (Guardrail::MedicationProvenance, Some(_)) => medication_provenance(source),
            (Guardrail::DiagnosisDatePolicy, Some(_)) => RuleOutcome::pass(
                "Date of diagnosis accepted; verify manually that it matches the pathology report date",
            ),
            (Guardrail::StagingConfirmation, Some(_)) => staging_confirmation(staging),
            (Guardrail::DiagnosisDatePolicy | Guardrail::StagingConfirmation, None) => {
                RuleOutcome::pass(EMPTY_ACCEPTABLE_REASON)
            }
            _ => RuleOutcome::pass(DEFAULT_PASS_REASON),
        }
    }
}

fn comorbidity_provenance(source: &str) -> RuleOutcome {
    if is_first_visit_note(source) {
        RuleOutcome::pass("Source is MD note visit 1; within 3-6 month window")
    } else {
        RuleOutcome::reject(
            RuleId::Rule001,
            format!(
                "REJECTED: comorbidity source '{}' is outside the 3-6 month window. {} violation.",
                source,
                RuleId::Rule001
            ),
        )
    }
}

fn medication_provenance(source: &str) -> RuleOutcome {
    match forbidden_medication_source(source) {
        Some(_) => RuleOutcome::reject(
            RuleId::Rule006,
            format!(
                "REJECTED: medication source '{}' is not an MD note. {} violation.",
                source,
                RuleId::Rule006
            ),
        ),
        None => RuleOutcome::pass("Source is MD note; valid for medication abstraction"),
    }
}

fn staging_confirmation(staging: StagingConfirmation) -> RuleOutcome {
    match (staging.imaging, staging.physician_note) {
        (true, true) => RuleOutcome::pass("Staging confirmed by both imaging and MD note"),
        (false, true) => RuleOutcome::reject(
            RuleId::Rule004,
            "REJECTED: staging missing imaging confirmation",
        ),
        (true, false) => RuleOutcome::reject(
            RuleId::Rule004,
            "REJECTED: staging missing MD documentation",
        ),
        (false, false) => RuleOutcome::reject(
            RuleId::Rule004,
            "REJECTED: staging requires both imaging AND MD confirmation",
        ),
    }
}
