//! End-to-end guardrail scenarios over JSON records.

use registry_guard_core::{
    evaluate, AuditTrailBuilder, Disposition, ExtractedRecord, GuardrailEngine, RecordError,
    RuleId, SchemaViolation, Section, SourceMap, StagingConfirmation,
};

fn record_json(sections: serde_json::Value) -> ExtractedRecord {
    let mut value = serde_json::json!({
        "patient_id": "patient_042",
        "timeline": {},
        "staging": {},
        "pathology": {},
        "comorbidities": {},
        "germline": {},
        "medications": {}
    });
    for (section, fields) in sections.as_object().unwrap() {
        value[section] = fields.clone();
    }
    ExtractedRecord::from_value(value).unwrap()
}

#[test]
fn all_absent_record_routes_only_mandatory_fields() {
    let record = record_json(serde_json::json!({}));
    let report = evaluate(&record, SourceMap::canonical(), StagingConfirmation::confirmed())
        .unwrap()
        .report;

    assert_eq!(report.rejected.len(), 0);
    assert_eq!(report.approved.len(), 26);
    assert_eq!(report.summary.safe_to_auto_populate, 26);

    let mut review: Vec<&str> = report
        .human_review_required
        .iter()
        .map(|v| v.field_key.as_str())
        .collect();
    review.sort_unstable();
    assert_eq!(
        review,
        vec![
            "germline.brca1_status",
            "germline.variant_found",
            "pathology.diagnosis",
            "staging.metastasis",
            "staging.overall_stage",
        ]
    );
    assert!(report.human_review_required.iter().all(|v| v.passed));
}

#[test]
fn all_absent_record_passes_even_without_staging_confirmation() {
    let record = record_json(serde_json::json!({}));
    let report = evaluate(&record, SourceMap::canonical(), StagingConfirmation::new(false, false))
        .unwrap()
        .report;
    assert_eq!(report.rejected.len(), 0);
}

#[test]
fn hypertension_from_nursing_note_rejected() {
    let record = record_json(serde_json::json!({
        "comorbidities": { "hypertension": "Yes" }
    }));
    let sources = SourceMap::canonical().with(Section::Comorbidities, "nursing_note");
    let report = evaluate(&record, sources, StagingConfirmation::confirmed())
        .unwrap()
        .report;

    let verdict = report.verdict("comorbidities.hypertension").unwrap();
    assert_eq!(verdict.disposition(), Disposition::Rejected);
    assert!(verdict.reason.contains("RULE 001"));
    assert!(verdict.reason.contains("nursing_note"));
}

#[test]
fn comorbidity_from_pharmacy_uses_comorbidity_rule() {
    let record = record_json(serde_json::json!({
        "comorbidities": { "diabetes": "Type 2" }
    }));
    let sources = SourceMap::canonical().with(Section::Comorbidities, "pharmacy_dispensing_log");
    let report = evaluate(&record, sources, StagingConfirmation::confirmed())
        .unwrap()
        .report;

    let verdict = report.verdict("comorbidities.diabetes").unwrap();
    assert!(!verdict.passed);
    assert_eq!(verdict.violated_rule, Some(RuleId::Rule001));
}

#[test]
fn comorbidities_from_later_visits_rejected() {
    for source in ["visit2", "follow-up"] {
        let record = record_json(serde_json::json!({
            "comorbidities": { "other": "Asthma" }
        }));
        let sources = SourceMap::canonical().with(Section::Comorbidities, source);
        let report = evaluate(&record, sources, StagingConfirmation::confirmed())
            .unwrap()
            .report;
        let verdict = report.verdict("comorbidities.other").unwrap();
        assert!(!verdict.passed, "{} must be rejected", source);
        assert!(verdict.reason.contains("RULE 001"));
    }
}

#[test]
fn medications_from_dispensing_log_rejected() {
    let record = record_json(serde_json::json!({
        "medications": {
            "regimen": "Dose Dense AC-T",
            "drugs": "Doxorubicin, Cyclophosphamide"
        }
    }));
    let sources = SourceMap::canonical().with(Section::Medications, "pharmacy_dispensing_log");
    let report = evaluate(&record, sources, StagingConfirmation::confirmed())
        .unwrap()
        .report;

    for key in ["medications.regimen", "medications.drugs"] {
        let verdict = report.verdict(key).unwrap();
        assert_eq!(verdict.disposition(), Disposition::Rejected);
        assert_eq!(verdict.violated_rule, Some(RuleId::Rule006));
        assert!(verdict.reason.contains("RULE 006"));
    }
    // Absent medication fields are not penalized by the blocked source
    assert!(report.verdict("medications.intent").unwrap().passed);
}

#[test]
fn overall_stage_rejected_per_missing_confirmation() {
    let record = record_json(serde_json::json!({
        "staging": { "overall_stage": "IIB" }
    }));

    let reasons: Vec<String> = [(false, true), (true, false), (false, false)]
        .into_iter()
        .map(|(imaging, note)| {
            let report = evaluate(
                &record,
                SourceMap::canonical(),
                StagingConfirmation::new(imaging, note),
            )
            .unwrap()
            .report;
            let verdict = report.verdict("staging.overall_stage").unwrap();
            assert_eq!(verdict.disposition(), Disposition::Rejected);
            verdict.reason.clone()
        })
        .collect();

    assert_ne!(reasons[0], reasons[1]);
    assert_ne!(reasons[1], reasons[2]);
    assert_ne!(reasons[0], reasons[2]);

    let confirmed = evaluate(&record, SourceMap::canonical(), StagingConfirmation::confirmed())
        .unwrap()
        .report;
    assert_eq!(
        confirmed.verdict("staging.overall_stage").unwrap().disposition(),
        Disposition::HumanReview
    );
}

#[test]
fn diagnosis_date_passes_with_advisory() {
    let record = record_json(serde_json::json!({
        "timeline": { "date_of_diagnosis": "2024-02-18" }
    }));
    let report = evaluate(&record, SourceMap::canonical(), StagingConfirmation::confirmed())
        .unwrap()
        .report;

    let verdict = report.verdict("timeline.date_of_diagnosis").unwrap();
    assert_eq!(verdict.disposition(), Disposition::Approved);
    assert!(verdict.reason.contains("verify manually"));
}

#[test]
fn malformed_record_fails_loudly() {
    let result = ExtractedRecord::from_json(
        r#"{"patient_id": "p", "timeline": {}, "staging": {}, "pathology": {},
            "comorbidities": {}, "germline": {}, "medications": {}, "vitals": {}}"#,
    );
    assert!(matches!(result, Err(RecordError::SchemaError(_))));
}

#[test]
fn engine_rejects_audit_trail_from_another_record() {
    let first = record_json(serde_json::json!({ "pathology": { "grade": "Grade 2" } }));
    let second = record_json(serde_json::json!({ "pathology": { "grade": "Grade 3" } }));

    let trail = AuditTrailBuilder::new().build(&first).unwrap();
    let result = GuardrailEngine::new(StagingConfirmation::confirmed()).apply(&second, &trail.entries);
    assert_eq!(
        result,
        Err(SchemaViolation::EntryMismatch("pathology.grade".to_string()))
    );
}
