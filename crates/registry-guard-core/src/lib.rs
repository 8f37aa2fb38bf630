//! # registry-guard-core
//!
//! Deterministic audit-trail and guardrail engine for abstracted clinical
//! registry fields.
//!
//! For every field extracted from a patient's records, this crate answers:
//! - Where did the value come from, and which rule governs it?
//! - Is it safe to write to the registry form automatically?
//! - Must it be rejected, or routed to a human reviewer?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same record and sources always produce the same report
//! 2. **Complete**: Every report holds exactly one verdict per catalog field
//! 3. **Traceable**: Every rejection cites its rule and the offending source
//! 4. **Empty beats wrong**: An absent value never fails a rule
//!
//! ## Example
//!
//! ```rust,ignore
//! use registry_guard_core::{evaluate, ExtractedRecord, SourceMap, StagingConfirmation};
//!
//! let record = ExtractedRecord::from_json_file("patient_001.json")?;
//! let evaluation = evaluate(&record, SourceMap::canonical(), StagingConfirmation::confirmed())?;
//!
//! for verdict in &evaluation.report.rejected {
//!     println!("REJECTED {}: {}", verdict.field_key, verdict.reason);
//! }
//! ```

pub mod audit;
pub mod catalog;
pub mod guardrails;
pub mod record;
pub mod report;

// Re-export main types at crate root
pub use audit::{AuditEntry, AuditTrail, AuditTrailBuilder, CompletionSummary, Confidence, FieldStatus};
pub use catalog::{FieldSpec, RuleId, SchemaViolation, Section, FIELD_COUNT};
pub use guardrails::{
    Disposition, Guardrail, GuardrailEngine, GuardrailVerdict, RuleOutcome, StagingConfirmation,
};
pub use record::{ExtractedRecord, FieldValues, RecordError, SourceMap};
pub use report::{GuardrailReport, GuardrailSummary, ReportDigest};

use serde::{Deserialize, Serialize};

/// Audit trail and guardrail report produced by one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub audit: AuditTrail,
    pub report: GuardrailReport,
}

/// Build the audit trail for a record and apply the guardrails to it.
///
/// This is the main entry point for a single patient evaluation.
///
/// # Arguments
///
/// * `record` - The extracted record
/// * `sources` - Source-document category per section
/// * `staging` - Imaging and physician-note confirmations for the stage
///
/// # Returns
///
/// An [`Evaluation`] whose report partitions all 31 fields into rejected,
/// human-review and approved. Fails only on a [`SchemaViolation`].
pub fn evaluate(
    record: &ExtractedRecord,
    sources: SourceMap,
    staging: StagingConfirmation,
) -> Result<Evaluation, SchemaViolation> {
    let audit = AuditTrailBuilder::with_sources(sources).build(record)?;
    let report = GuardrailEngine::new(staging).apply(record, &audit.entries)?;
    Ok(Evaluation { audit, report })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATIENT_001: &str = r#"
patient_id: "patient_001"
timeline:
  date_of_diagnosis: "2024-02-18"
  date_of_last_visit: "2024-03-15"
  date_of_last_scan: "2024-02-10"
  date_of_death: null
staging:
  primary_cancer: "Invasive Ductal Carcinoma"
  laterality: "Left"
  t_stage: "T2"
  n_stage: "N1"
  m_stage: "M0"
  overall_stage: "IIB"
  metastasis: "No"
pathology:
  specimen_site: "Left breast"
  quadrant: "Upper outer quadrant"
  er_status: "Positive - 85%"
  pr_status: "Positive - 60%"
  her2_status: "Negative"
  ki67_percentage: "35%"
  grade: "Grade 3 - Nottingham score 8/9"
  diagnosis: "Invasive Ductal Carcinoma, ER+, PR+, HER2-"
comorbidities:
  hypertension: "Yes - documented in visit 1"
  diabetes: null
  hypothyroidism: "Yes - documented in visit 1"
  other: null
germline:
  brca1_status: "Pathogenic variant detected"
  brca2_status: "Negative"
  variant_found: "c.5266dupC (p.Gln1756Profs*74)"
  classification: "Pathogenic - HBOC Syndrome"
medications:
  line_of_treatment: "1st line"
  intent: "Neoadjuvant"
  regimen: "Dose Dense AC-T"
  drugs: "Doxorubicin, Cyclophosphamide, Paclitaxel"
"#;

    #[test]
    fn test_basic_evaluation() {
        let record = ExtractedRecord::from_yaml(PATIENT_001).unwrap();
        let evaluation =
            evaluate(&record, SourceMap::canonical(), StagingConfirmation::confirmed()).unwrap();

        assert_eq!(evaluation.audit.summary.populated_count, 28);
        assert_eq!(evaluation.audit.summary.completion_rate, "90.3%");

        // Canonical sources pass every provenance rule
        assert_eq!(evaluation.report.summary.rejected, 0);
        assert_eq!(evaluation.report.summary.human_review_required, 5);
        assert_eq!(evaluation.report.summary.safe_to_auto_populate, 26);
    }

    #[test]
    fn test_pharmacy_medications_rejected() {
        let record = ExtractedRecord::from_yaml(PATIENT_001).unwrap();
        let sources = SourceMap::canonical().with(Section::Medications, "pharmacy_dispensing_log");
        let evaluation = evaluate(&record, sources, StagingConfirmation::confirmed()).unwrap();

        assert_eq!(evaluation.report.summary.rejected, 4);
        assert!(evaluation
            .report
            .rejected
            .iter()
            .all(|v| v.field_key.starts_with("medications.")
                && v.violated_rule == Some(RuleId::Rule006)));
    }
}
