//! Guardrails: deterministic policy rules gating automatic population.
//!
//! | Guardrail | Applies to | Rule |
//! |---|---|---|
//! | Comorbidity provenance | `comorbidities.*` | RULE 001 |
//! | Medication provenance | `medications.*` | RULE 006 |
//! | Diagnosis-date policy | `timeline.date_of_diagnosis` | RULE 008 |
//! | Staging confirmation | `staging.overall_stage` | RULE 004 |
//! | Default | everything else | none |
//!
//! On top of the per-field rule, absent high-risk fields get the
//! empty-beats-wrong narrative, and the mandatory-review fields are routed
//! to a human unless they were rejected.

mod engine;
pub mod patterns;
mod rules;

pub use engine::{Disposition, GuardrailEngine, GuardrailVerdict};
pub use rules::{
    Guardrail, RuleOutcome, StagingConfirmation, DEFAULT_PASS_REASON, EMPTY_ACCEPTABLE_REASON,
    EMPTY_BEATS_WRONG_REASON,
};
