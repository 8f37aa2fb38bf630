//! Provenance patterns shared by the source-document guardrails.
//!
//! Source categories are free text supplied by the caller, so matching is
//! case-insensitive substring matching. The medication list is a blocklist:
//! a category matching neither pattern is not rejected.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Identifiers accepted as the first-visit physician note.
    pub static ref FIRST_VISIT_SOURCE: Regex = Regex::new(
        r"(?i)md_note_visit1|visit1|visit 1"
    ).unwrap();

    /// Source categories medications must never be abstracted from.
    pub static ref FORBIDDEN_MEDICATION_SOURCE: Regex = Regex::new(
        r"(?i)pharmacy|nursing|dispensing|prescription"
    ).unwrap();
}

/// Check if a source category identifies the first-visit physician note.
pub fn is_first_visit_note(source: &str) -> bool {
    FIRST_VISIT_SOURCE.is_match(source)
}

/// Return the forbidden keyword a medication source matches, if any.
pub fn forbidden_medication_source(source: &str) -> Option<&str> {
    FORBIDDEN_MEDICATION_SOURCE
        .find(source)
        .map(|m| m.as_str())
}
