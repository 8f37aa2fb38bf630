//! Field catalog: the fixed set of registry fields and the policy bound to each.
//!
//! The catalog is immutable configuration data. Every one of the 31 leaf
//! fields carries the compliance rule that governs it, the guardrail variant
//! that evaluates it, and its review flags. Lookup is O(1) by field key
//! (`section.field_name`); an unknown key is a schema violation.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::guardrails::Guardrail;

/// Number of leaf fields in the registry form.
pub const FIELD_COUNT: usize = 31;

/// Structural violations of the extraction contract.
///
/// These are fatal to a single evaluation. Policy violations are never
/// reported through this type; they become rejected verdicts instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    #[error("Unknown section: {0}")]
    UnknownSection(String),

    #[error("Unrecognized field: {0}")]
    UnknownField(String),

    #[error("Field {0} holds an empty string; absent values must be null")]
    EmptyValue(String),

    #[error("Audit trail has no entry for field {0}")]
    MissingEntry(String),

    #[error("Audit trail has more than one entry for field {0}")]
    DuplicateEntry(String),

    #[error("Audit entry for {0} does not match the extracted record")]
    EntryMismatch(String),
}

/// The six sections of the registry form, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Timeline,
    Staging,
    Pathology,
    Comorbidities,
    Germline,
    Medications,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Timeline,
        Section::Staging,
        Section::Pathology,
        Section::Comorbidities,
        Section::Germline,
        Section::Medications,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Timeline => "timeline",
            Section::Staging => "staging",
            Section::Pathology => "pathology",
            Section::Comorbidities => "comorbidities",
            Section::Germline => "germline",
            Section::Medications => "medications",
        }
    }

    /// The source-document category this section is canonically abstracted from.
    pub fn canonical_source(&self) -> &'static str {
        match self {
            Section::Timeline => "patient_record + md_notes + radiology",
            Section::Staging => "md_note_visit2 + radiology + pathology",
            Section::Pathology => "pathology_report",
            Section::Comorbidities => "md_note_visit1 (first visit, within 3-6 months)",
            Section::Germline => "germline_testing_report",
            Section::Medications => "md_notes (physician notes only)",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = SchemaViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .iter()
            .copied()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| SchemaViolation::UnknownSection(s.to_string()))
    }
}

/// Compliance rule identifiers referenced by the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleId {
    /// Comorbidities only from the first-visit physician note.
    #[serde(rename = "RULE 001")]
    Rule001,
    /// Site and laterality from pathology and imaging.
    #[serde(rename = "RULE 002")]
    Rule002,
    /// Receptor status, grade and diagnosis from the pathology report.
    #[serde(rename = "RULE 003")]
    Rule003,
    /// Staging confirmed by imaging and physician documentation.
    #[serde(rename = "RULE 004")]
    Rule004,
    /// Germline results only from the genetic testing report.
    #[serde(rename = "RULE 005")]
    Rule005,
    /// Medications only from physician notes.
    #[serde(rename = "RULE 006")]
    Rule006,
    /// Dates, with diagnosis date = pathology confirmation date.
    #[serde(rename = "RULE 008")]
    Rule008,
    /// Metastasis confirmed by PET-CT plus physician documentation.
    #[serde(rename = "RULE 009")]
    Rule009,
}

impl RuleId {
    pub fn code(&self) -> &'static str {
        match self {
            RuleId::Rule001 => "RULE 001",
            RuleId::Rule002 => "RULE 002",
            RuleId::Rule003 => "RULE 003",
            RuleId::Rule004 => "RULE 004",
            RuleId::Rule005 => "RULE 005",
            RuleId::Rule006 => "RULE 006",
            RuleId::Rule008 => "RULE 008",
            RuleId::Rule009 => "RULE 009",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Catalog entry for one leaf field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Full key, e.g. `pathology.er_status`
    pub key: &'static str,

    pub section: Section,

    /// Field name within the section, e.g. `er_status`
    pub name: &'static str,

    /// Compliance rule governing the field
    pub rule: RuleId,

    /// Human-readable statement of the rule as applied to this field
    pub rule_text: &'static str,

    /// What the extraction service is asked to return for the field
    pub hint: &'static str,

    /// Guardrail variant that evaluates the field
    pub guardrail: Guardrail,

    /// Always routed to a human reviewer unless rejected outright
    pub mandatory_review: bool,

    /// Absence is explicitly preferred to an unverified value
    pub empty_beats_wrong: bool,
}

impl FieldSpec {
    const fn new(
        key: &'static str,
        section: Section,
        name: &'static str,
        rule: RuleId,
        rule_text: &'static str,
        hint: &'static str,
    ) -> Self {
        let guardrail = match section {
            Section::Comorbidities => Guardrail::ComorbidityProvenance,
            Section::Medications => Guardrail::MedicationProvenance,
            _ => Guardrail::Default,
        };

        Self {
            key,
            section,
            name,
            rule,
            rule_text,
            hint,
            guardrail,
            mandatory_review: false,
            empty_beats_wrong: false,
        }
    }

    const fn guarded_by(mut self, guardrail: Guardrail) -> Self {
        self.guardrail = guardrail;
        self
    }

    const fn review(mut self) -> Self {
        self.mandatory_review = true;
        self
    }

    const fn empty_beats_wrong(mut self) -> Self {
        self.empty_beats_wrong = true;
        self
    }

    /// Rule reference as written to the audit trail.
    pub fn rule_reference(&self) -> String {
        format!("{} - {}", self.rule.code(), self.rule_text)
    }
}

macro_rules! field {
    ($section:ident . $name:ident, $variant:ident, $rule:ident, $text:literal, $hint:literal) => {
        FieldSpec::new(
            concat!(stringify!($section), ".", stringify!($name)),
            Section::$variant,
            stringify!($name),
            RuleId::$rule,
            $text,
            $hint,
        )
    };
}

static FIELDS: [FieldSpec; FIELD_COUNT] = [
    field!(timeline.date_of_diagnosis, Timeline, Rule008, "Date of diagnosis = pathology confirmation date only",
        "date pathology confirmed cancer or null")
        .guarded_by(Guardrail::DiagnosisDatePolicy),
    field!(timeline.date_of_last_visit, Timeline, Rule008, "Most recent visit date from MD notes",
        "most recent visit date or null"),
    field!(timeline.date_of_last_scan, Timeline, Rule008, "Most recent imaging date from radiology",
        "most recent imaging date or null"),
    field!(timeline.date_of_death, Timeline, Rule008, "Date of death from patient record",
        "date of death or null"),
    field!(staging.primary_cancer, Staging, Rule004, "Cancer type confirmed by pathology",
        "cancer type or null"),
    field!(staging.laterality, Staging, Rule002, "Laterality from pathology and imaging",
        "left/right/bilateral or null"),
    field!(staging.t_stage, Staging, Rule004, "T stage confirmed by imaging AND MD note",
        "T stage or null").empty_beats_wrong(),
    field!(staging.n_stage, Staging, Rule004, "N stage confirmed by imaging AND MD note",
        "N stage or null").empty_beats_wrong(),
    field!(staging.m_stage, Staging, Rule004, "M stage confirmed by PET-CT",
        "M stage or null").empty_beats_wrong(),
    field!(staging.overall_stage, Staging, Rule004, "Stage group from TNM combination",
        "stage group or null")
        .guarded_by(Guardrail::StagingConfirmation)
        .review(),
    field!(staging.metastasis, Staging, Rule009, "Metastasis confirmed by PET-CT + MD documentation",
        "yes/no or null").review(),
    field!(pathology.specimen_site, Pathology, Rule002, "Specimen site from pathology report",
        "biopsy site or null"),
    field!(pathology.quadrant, Pathology, Rule002, "Quadrant from pathology report",
        "breast quadrant or null"),
    field!(pathology.er_status, Pathology, Rule003, "ER status from IHC in pathology report",
        "ER positive/negative or null").empty_beats_wrong(),
    field!(pathology.pr_status, Pathology, Rule003, "PR status from IHC in pathology report",
        "PR positive/negative or null"),
    field!(pathology.her2_status, Pathology, Rule003, "HER2 status from IHC/FISH in pathology report",
        "HER2 positive/negative or null").empty_beats_wrong(),
    field!(pathology.ki67_percentage, Pathology, Rule003, "Ki67 from pathology report",
        "Ki67 percentage or null"),
    field!(pathology.grade, Pathology, Rule003, "Grade from pathology report",
        "tumor grade or null"),
    field!(pathology.diagnosis, Pathology, Rule003, "Full diagnosis from pathology report",
        "full pathology diagnosis or null").review(),
    field!(comorbidities.hypertension, Comorbidities, Rule001, "ONLY from MD note within first 3-6 months",
        "yes/no ONLY if MD note first 3-6 months or null"),
    field!(comorbidities.diabetes, Comorbidities, Rule001, "ONLY from MD note within first 3-6 months",
        "yes/no ONLY if MD note first 3-6 months or null"),
    field!(comorbidities.hypothyroidism, Comorbidities, Rule001, "ONLY from MD note within first 3-6 months",
        "yes/no ONLY if MD note first 3-6 months or null"),
    field!(comorbidities.other, Comorbidities, Rule001, "ONLY from MD note within first 3-6 months",
        "other comorbidities from first 3-6 months MD note or null"),
    field!(germline.brca1_status, Germline, Rule005, "ONLY from official genetic testing report",
        "pathogenic/negative or null").review(),
    field!(germline.brca2_status, Germline, Rule005, "ONLY from official genetic testing report",
        "pathogenic/negative or null"),
    field!(germline.variant_found, Germline, Rule005, "ONLY from official genetic testing report",
        "variant name or null").review(),
    field!(germline.classification, Germline, Rule005, "ONLY from official genetic testing report",
        "classification or null"),
    field!(medications.line_of_treatment, Medications, Rule006, "ONLY from MD notes",
        "1st line/2nd line or null"),
    field!(medications.intent, Medications, Rule006, "ONLY from MD notes",
        "neoadjuvant/adjuvant/palliative or null"),
    field!(medications.regimen, Medications, Rule006, "ONLY from MD notes",
        "regimen name or null"),
    field!(medications.drugs, Medications, Rule006, "ONLY from MD notes",
        "list of drugs or null").empty_beats_wrong(),
];

lazy_static! {
    static ref INDEX: HashMap<&'static str, &'static FieldSpec> =
        FIELDS.iter().map(|spec| (spec.key, spec)).collect();
}

/// All catalog entries in form order.
pub fn fields() -> &'static [FieldSpec] {
    &FIELDS
}

/// Entries belonging to one section, in form order.
pub fn section_fields(section: Section) -> impl Iterator<Item = &'static FieldSpec> {
    FIELDS.iter().filter(move |spec| spec.section == section)
}

/// Look up a field by its full key.
pub fn lookup(key: &str) -> Result<&'static FieldSpec, SchemaViolation> {
    INDEX
        .get(key)
        .copied()
        .ok_or_else(|| SchemaViolation::UnknownField(key.to_string()))
}

/// Look up a field by section and field name.
pub fn lookup_in(section: Section, name: &str) -> Result<&'static FieldSpec, SchemaViolation> {
    lookup(&format!("{}.{}", section, name))
}

/// Keys of the fields that always require human review.
pub fn mandatory_review_fields() -> impl Iterator<Item = &'static str> {
    FIELDS
        .iter()
        .filter(|spec| spec.mandatory_review)
        .map(|spec| spec.key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_has_31_unique_fields() {
        assert_eq!(fields().len(), FIELD_COUNT);

        let keys: HashSet<&str> = fields().iter().map(|f| f.key).collect();
        assert_eq!(keys.len(), FIELD_COUNT, "Field keys must be unique");
    }

    #[test]
    fn test_section_field_counts() {
        let counts: Vec<usize> = Section::ALL
            .iter()
            .map(|s| section_fields(*s).count())
            .collect();
        assert_eq!(counts, vec![4, 7, 8, 4, 4, 4]);
    }

    #[test]
    fn test_keys_match_section_and_name() {
        for spec in fields() {
            assert_eq!(spec.key, format!("{}.{}", spec.section, spec.name));
        }
    }

    #[test]
    fn test_lookup_known_field() {
        let spec = lookup("pathology.er_status").unwrap();
        assert_eq!(spec.section, Section::Pathology);
        assert_eq!(spec.rule, RuleId::Rule003);
        assert!(spec.empty_beats_wrong);
        assert!(!spec.mandatory_review);
    }

    #[test]
    fn test_lookup_unknown_field_is_violation() {
        assert_eq!(
            lookup("pathology.tumor_size"),
            Err(SchemaViolation::UnknownField("pathology.tumor_size".to_string()))
        );
        assert!(lookup("er_status").is_err());
    }

    #[test]
    fn test_lookup_in_section() {
        let spec = lookup_in(Section::Medications, "drugs").unwrap();
        assert_eq!(spec.key, "medications.drugs");
        assert_eq!(spec.guardrail, Guardrail::MedicationProvenance);
    }

    #[test]
    fn test_guardrail_assignment() {
        for spec in section_fields(Section::Comorbidities) {
            assert_eq!(spec.guardrail, Guardrail::ComorbidityProvenance);
        }
        assert_eq!(
            lookup("timeline.date_of_diagnosis").unwrap().guardrail,
            Guardrail::DiagnosisDatePolicy
        );
        assert_eq!(
            lookup("staging.overall_stage").unwrap().guardrail,
            Guardrail::StagingConfirmation
        );
        assert_eq!(lookup("germline.brca2_status").unwrap().guardrail, Guardrail::Default);
    }

    #[test]
    fn test_mandatory_review_list() {
        let review: Vec<&str> = mandatory_review_fields().collect();
        assert_eq!(
            review,
            vec![
                "staging.overall_stage",
                "staging.metastasis",
                "pathology.diagnosis",
                "germline.brca1_status",
                "germline.variant_found",
            ]
        );
    }

    #[test]
    fn test_empty_beats_wrong_list() {
        let flagged: Vec<&str> = fields()
            .iter()
            .filter(|f| f.empty_beats_wrong)
            .map(|f| f.key)
            .collect();
        assert_eq!(
            flagged,
            vec![
                "staging.t_stage",
                "staging.n_stage",
                "staging.m_stage",
                "pathology.er_status",
                "pathology.her2_status",
                "medications.drugs",
            ]
        );
    }

    #[test]
    fn test_every_field_has_extraction_hint() {
        for spec in fields() {
            assert!(spec.hint.ends_with("or null"), "{} hint must allow null", spec.key);
            assert!(spec.hint.len() > "or null".len(), "{} hint is empty", spec.key);
        }
        assert_eq!(
            lookup("comorbidities.other").unwrap().hint,
            "other comorbidities from first 3-6 months MD note or null"
        );
        assert_eq!(lookup("germline.brca2_status").unwrap().hint, "pathogenic/negative or null");
    }

    #[test]
    fn test_rule_reference_format() {
        let spec = lookup("comorbidities.diabetes").unwrap();
        assert_eq!(
            spec.rule_reference(),
            "RULE 001 - ONLY from MD note within first 3-6 months"
        );
    }

    #[test]
    fn test_section_from_str() {
        assert_eq!("germline".parse::<Section>().unwrap(), Section::Germline);
        assert!(matches!(
            "labs".parse::<Section>(),
            Err(SchemaViolation::UnknownSection(_))
        ));
    }
}
