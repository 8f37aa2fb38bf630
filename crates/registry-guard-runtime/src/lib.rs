//! # registry-guard-runtime
//!
//! Collaborators around the deterministic engine in `registry-guard-core`:
//! document loading, extraction, audit-log persistence and the pipeline
//! that ties them together.
//!
//! ## Important
//!
//! Extraction is the only non-deterministic step. Whatever an extractor
//! returns is validated against the extraction schema and then judged by
//! the core guardrails; nothing here can approve a field on its own.
//!
//! ## Example
//!
//! ```rust,ignore
//! use registry_guard_runtime::{Pipeline, RuntimeConfig};
//! use registry_guard_core::StagingConfirmation;
//!
//! let config = RuntimeConfig::from_yaml_file("registry-guard.yaml")?;
//! let pipeline = Pipeline::from_config(config)?;
//!
//! let outcome = pipeline.run("patient_001", StagingConfirmation::confirmed()).await?;
//! println!("audit log: {}", outcome.audit_file.display());
//! ```

pub mod audit_log;
pub mod config;
pub mod documents;
pub mod pipeline;
pub mod prompts;
pub mod providers;

pub use audit_log::{AuditLog, AuditLogError, AuditWriter};
pub use config::{ConfigError, ExtractionConfig, ExtractorKind, RuntimeConfig};
pub use documents::{DirectoryStore, DocumentError, DocumentStore, PatientDocuments};
pub use pipeline::{Pipeline, PipelineError, PipelineOutcome};
pub use providers::{ExtractionError, ExtractionMode, Extractor, FixtureExtractor};

#[cfg(feature = "http")]
pub use providers::HttpExtractor;
