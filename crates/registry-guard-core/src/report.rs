//! Guardrail report: the partitioned verdicts and their summary.

use serde::{Deserialize, Serialize};

use crate::guardrails::{Disposition, GuardrailVerdict};

/// Aggregate counts over a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardrailSummary {
    pub total_checked: usize,
    pub approved: usize,
    pub rejected: usize,
    pub human_review_required: usize,

    /// Fields that may be written to the form without intervention
    pub safe_to_auto_populate: usize,

    /// Rejected plus human-review fields
    pub requires_manual_action: usize,
}

/// Counts-only view of a report for the HTTP-facing summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDigest {
    pub fields_safe_to_populate: usize,
    pub fields_needing_review: usize,
    pub action_required: bool,
}

/// Verdicts for every field, partitioned into three disjoint sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardrailReport {
    pub patient_id: String,
    pub rejected: Vec<GuardrailVerdict>,
    pub human_review_required: Vec<GuardrailVerdict>,
    pub approved: Vec<GuardrailVerdict>,
    pub summary: GuardrailSummary,
}

impl GuardrailReport {
    /// Partition verdicts by disposition, preserving their order.
    pub fn from_verdicts(patient_id: impl Into<String>, verdicts: Vec<GuardrailVerdict>) -> Self {
        let total_checked = verdicts.len();
        let mut rejected = Vec::new();
        let mut human_review_required = Vec::new();
        let mut approved = Vec::new();

        for verdict in verdicts {
            match verdict.disposition() {
                Disposition::Rejected => rejected.push(verdict),
                Disposition::HumanReview => human_review_required.push(verdict),
                Disposition::Approved => approved.push(verdict),
            }
        }

        let summary = GuardrailSummary {
            total_checked,
            approved: approved.len(),
            rejected: rejected.len(),
            human_review_required: human_review_required.len(),
            safe_to_auto_populate: approved.len(),
            requires_manual_action: rejected.len() + human_review_required.len(),
        };

        Self {
            patient_id: patient_id.into(),
            rejected,
            human_review_required,
            approved,
            summary,
        }
    }

    /// All verdicts: rejected, then human review, then approved.
    pub fn verdicts(&self) -> impl Iterator<Item = &GuardrailVerdict> {
        self.rejected
            .iter()
            .chain(self.human_review_required.iter())
            .chain(self.approved.iter())
    }

    /// Find the verdict for a field.
    pub fn verdict(&self, field_key: &str) -> Option<&GuardrailVerdict> {
        self.verdicts().find(|v| v.field_key == field_key)
    }

    /// True when every field may be auto-populated.
    pub fn is_clean(&self) -> bool {
        self.summary.requires_manual_action == 0
    }

    pub fn digest(&self) -> ReportDigest {
        ReportDigest {
            fields_safe_to_populate: self.summary.safe_to_auto_populate,
            fields_needing_review: self.summary.human_review_required,
            action_required: self.summary.requires_manual_action > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(key: &str, passed: bool, review: bool) -> GuardrailVerdict {
        GuardrailVerdict {
            field_key: key.to_string(),
            value: Some("x".to_string()),
            passed,
            reason: "test".to_string(),
            requires_human_review: review,
            violated_rule: None,
        }
    }

    #[test]
    fn test_partition_precedence() {
        let report = GuardrailReport::from_verdicts(
            "p1",
            vec![
                verdict("a.fail", false, false),
                verdict("a.fail_review", false, true),
                verdict("a.review", true, true),
                verdict("a.ok", true, false),
            ],
        );

        let keys = |v: &[GuardrailVerdict]| -> Vec<String> {
            v.iter().map(|x| x.field_key.clone()).collect()
        };
        assert_eq!(keys(&report.rejected), vec!["a.fail", "a.fail_review"]);
        assert_eq!(keys(&report.human_review_required), vec!["a.review"]);
        assert_eq!(keys(&report.approved), vec!["a.ok"]);
    }

    #[test]
    fn test_summary_counts() {
        let report = GuardrailReport::from_verdicts(
            "p1",
            vec![
                verdict("a", false, false),
                verdict("b", true, true),
                verdict("c", true, false),
                verdict("d", true, false),
            ],
        );
        assert_eq!(
            report.summary,
            GuardrailSummary {
                total_checked: 4,
                approved: 2,
                rejected: 1,
                human_review_required: 1,
                safe_to_auto_populate: 2,
                requires_manual_action: 2,
            }
        );
        assert!(!report.is_clean());
    }

    #[test]
    fn test_digest() {
        let report = GuardrailReport::from_verdicts(
            "p1",
            vec![verdict("a", true, true), verdict("b", true, false)],
        );
        let digest = report.digest();
        assert_eq!(digest.fields_safe_to_populate, 1);
        assert_eq!(digest.fields_needing_review, 1);
        assert!(digest.action_required);

        let clean = GuardrailReport::from_verdicts("p1", vec![verdict("b", true, false)]);
        assert!(!clean.digest().action_required);
        assert!(clean.is_clean());
    }

    #[test]
    fn test_serialized_field_names() {
        let report = GuardrailReport::from_verdicts("p1", vec![verdict("a", true, true)]);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["humanReviewRequired"].is_array());
        assert_eq!(json["summary"]["safeToAutoPopulate"], 0);
        assert_eq!(json["summary"]["requiresManualAction"], 1);

        let digest = serde_json::to_value(report.digest()).unwrap();
        assert_eq!(digest["fieldsNeedingReview"], 1);
        assert_eq!(digest["actionRequired"], true);
    }
}
