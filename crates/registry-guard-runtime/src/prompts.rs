//! Extraction prompt for the remote extraction service.
//!
//! The prompt has three parts:
//! 1. Abstractor framing and the patient documents
//! 2. A JSON template listing every catalog field with its catalog hint
//! 3. The abstraction rules the guardrails later enforce
//!
//! The template is generated from the field catalog so the service is
//! always asked for exactly the fields the engine expects.

use std::fmt::Write;

use registry_guard_core::{catalog, Section};

use crate::documents::PatientDocuments;

/// Framing shared by every extraction request.
pub const ABSTRACTOR_PREAMBLE: &str = r#"You are a clinical data abstractor.
Read these patient documents and extract information
to fill the registry form fields."#;

/// Output instructions placed before the template.
pub const OUTPUT_INSTRUCTIONS: &str = r#"Return ONLY raw JSON. No markdown. No code fences.
Start directly with {"#;

/// Abstraction rules. Values violating them are rejected downstream.
pub const ABSTRACTION_RULES: &str = r#"CRITICAL RULES:
1. Comorbidities ONLY from MD notes in first 3-6 months
2. Medications ONLY from MD notes
3. Date of diagnosis = pathology confirmation date only
4. If not found use null
5. Never guess"#;

/// JSON template with one hinted entry per catalog field, in form order.
pub fn field_template() -> String {
    let mut out = String::from("{\n");

    for (i, section) in Section::ALL.iter().enumerate() {
        let _ = writeln!(out, "  \"{}\": {{", section);

        let specs: Vec<_> = catalog::section_fields(*section).collect();
        for (j, spec) in specs.iter().enumerate() {
            let comma = if j + 1 < specs.len() { "," } else { "" };
            let _ = writeln!(out, "    \"{}\": \"{}\"{}", spec.name, spec.hint, comma);
        }

        let comma = if i + 1 < Section::ALL.len() { "," } else { "" };
        let _ = writeln!(out, "  }}{}", comma);
    }

    out.push('}');
    out
}

/// Build the full extraction prompt for one patient.
///
/// Each document appears under a `--- DOC_TYPE ---` header.
pub fn build_extraction_prompt(documents: &PatientDocuments) -> String {
    let mut combined = String::new();
    for (doc_type, content) in &documents.documents {
        let _ = write!(combined, "\n\n--- {} ---\n{}", doc_type.to_uppercase(), content);
    }

    format!(
        "{}\n\nPATIENT DOCUMENTS:\n{}\n\n{}\n\n{}\n\n{}",
        ABSTRACTOR_PREAMBLE,
        combined,
        OUTPUT_INSTRUCTIONS,
        field_template(),
        ABSTRACTION_RULES
    )
}
