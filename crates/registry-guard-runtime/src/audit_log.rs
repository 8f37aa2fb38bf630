//! Persisted audit logs.
//!
//! One JSON file per pipeline run, named
//! `audit_<patient_id>_<YYYYMMDD_HHMMSS>.json`, with a `_<n>` suffix when an
//! earlier run already used that name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use registry_guard_core::{AuditEntry, AuditTrail, CompletionSummary};

use crate::providers::ExtractionMode;

/// Suffixes tried before giving up on a free file name.
const MAX_NAME_ATTEMPTS: usize = 1000;

#[derive(Error, Debug)]
pub enum AuditLogError {
    #[error("Failed to write audit log: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to serialize audit log: {0}")]
    SerializeError(#[from] serde_json::Error),
}

/// Audit trail stamped with processing time and extraction mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub patient_id: String,
    pub processed_at: DateTime<Utc>,
    pub mode: ExtractionMode,
    pub fields: Vec<AuditEntry>,
    pub summary: CompletionSummary,
}

impl AuditLog {
    pub fn new(
        patient_id: impl Into<String>,
        mode: ExtractionMode,
        trail: AuditTrail,
        processed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            processed_at,
            mode,
            fields: trail.entries,
            summary: trail.summary,
        }
    }

    /// File name this log is saved under when no earlier log collides.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.file_stem())
    }

    fn file_stem(&self) -> String {
        format!(
            "audit_{}_{}",
            sanitize(&self.patient_id),
            self.processed_at.format("%Y%m%d_%H%M%S")
        )
    }
}

/// Keep patient ids from escaping the audit directory.
fn sanitize(patient_id: &str) -> String {
    patient_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Writes audit logs into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct AuditWriter {
    dir: PathBuf,
}

impl AuditWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Save the log as pretty-printed JSON and return its path.
    ///
    /// Existing logs are never overwritten: a run landing in the same second
    /// as an earlier one gets a `_<n>` suffix.
    pub async fn save(&self, log: &AuditLog) -> Result<PathBuf, AuditLogError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let json = serde_json::to_string_pretty(log)?;
        let stem = log.file_stem();

        let mut attempt = 0;
        let (path, mut file) = loop {
            let name = if attempt == 0 {
                format!("{}.json", stem)
            } else {
                format!("{}_{}.json", stem, attempt)
            };
            let path = self.dir.join(name);

            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => break (path, file),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if attempt >= MAX_NAME_ATTEMPTS {
                        return Err(e.into());
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        };

        file.write_all(json.as_bytes()).await?;
        file.flush().await?;

        tracing::info!(
            patient_id = %log.patient_id,
            path = %path.display(),
            "Audit log saved"
        );
        Ok(path)
    }
}
