//! Property tests for the guardrail report invariants.

use proptest::prelude::*;
use std::collections::HashSet;

use registry_guard_core::{
    catalog, evaluate, Disposition, ExtractedRecord, Section, SourceMap, StagingConfirmation,
    FIELD_COUNT,
};

const SOURCES: &[&str] = &[
    "md_note_visit1",
    "md_note_visit2",
    "Visit 1 intake",
    "follow-up",
    "visit2",
    "nursing_note",
    "pharmacy_dispensing_log",
    "PRESCRIPTION feed",
    "pathology_report",
    "tumor board",
];

fn arb_record() -> impl Strategy<Value = ExtractedRecord> {
    proptest::collection::vec(proptest::option::of("[A-Za-z0-9 ]{1,12}"), FIELD_COUNT).prop_map(
        |values| {
            let mut record = ExtractedRecord::empty("patient_prop");
            for (spec, value) in catalog::fields().iter().zip(values) {
                record.set(spec.key, value.as_deref()).unwrap();
            }
            record
        },
    )
}

fn arb_sources() -> impl Strategy<Value = SourceMap> {
    proptest::collection::vec(proptest::sample::select(SOURCES), Section::ALL.len()).prop_map(
        |picked| {
            Section::ALL
                .iter()
                .zip(picked)
                .fold(SourceMap::canonical(), |map, (section, source)| {
                    map.with(*section, source)
                })
        },
    )
}

fn arb_staging() -> impl Strategy<Value = StagingConfirmation> {
    (any::<bool>(), any::<bool>()).prop_map(|(imaging, note)| StagingConfirmation::new(imaging, note))
}

proptest! {
    #[test]
    fn partitions_are_disjoint_and_complete(
        record in arb_record(),
        sources in arb_sources(),
        staging in arb_staging(),
    ) {
        let report = evaluate(&record, sources, staging).unwrap().report;

        let total = report.rejected.len() + report.human_review_required.len() + report.approved.len();
        prop_assert_eq!(total, FIELD_COUNT);
        prop_assert_eq!(report.summary.total_checked, FIELD_COUNT);

        let keys: HashSet<&str> = report.verdicts().map(|v| v.field_key.as_str()).collect();
        prop_assert_eq!(keys.len(), FIELD_COUNT);

        prop_assert!(report.rejected.iter().all(|v| v.disposition() == Disposition::Rejected));
        prop_assert!(report.human_review_required.iter().all(|v| v.disposition() == Disposition::HumanReview));
        prop_assert!(report.approved.iter().all(|v| v.disposition() == Disposition::Approved));
        prop_assert_eq!(
            report.summary.requires_manual_action,
            report.rejected.len() + report.human_review_required.len()
        );
    }

    #[test]
    fn absent_values_never_fail(
        record in arb_record(),
        sources in arb_sources(),
        staging in arb_staging(),
    ) {
        let report = evaluate(&record, sources, staging).unwrap().report;
        for verdict in report.verdicts() {
            if verdict.value.is_none() {
                prop_assert!(verdict.passed, "{} failed while absent", verdict.field_key);
            }
        }
    }

    #[test]
    fn mandatory_review_fields_never_approved(
        record in arb_record(),
        sources in arb_sources(),
        staging in arb_staging(),
    ) {
        let report = evaluate(&record, sources, staging).unwrap().report;
        for key in catalog::mandatory_review_fields() {
            let verdict = report.verdict(key).unwrap();
            prop_assert!(verdict.disposition() != Disposition::Approved);
        }
    }

    #[test]
    fn evaluation_is_idempotent(
        record in arb_record(),
        sources in arb_sources(),
        staging in arb_staging(),
    ) {
        let first = evaluate(&record, sources.clone(), staging).unwrap();
        let second = evaluate(&record, sources, staging).unwrap();
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        prop_assert_eq!(first, second);
    }
}
