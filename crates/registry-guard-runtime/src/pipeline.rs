//! End-to-end abstraction pipeline.
//!
//! Load documents, extract a record, build and persist the audit trail, then
//! apply the guardrails. Only extraction is retried; every step after it is
//! deterministic.

use backon::{ExponentialBuilder, Retryable};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use registry_guard_core::{
    AuditTrailBuilder, CompletionSummary, ExtractedRecord, GuardrailEngine, GuardrailReport,
    ReportDigest, SchemaViolation, StagingConfirmation,
};

use crate::audit_log::{AuditLog, AuditLogError, AuditWriter};
use crate::config::{ExtractorKind, RuntimeConfig};
use crate::documents::{DirectoryStore, DocumentError, DocumentStore, PatientDocuments};
use crate::providers::{ExtractionError, ExtractionMode, Extractor, FixtureExtractor};

/// Errors from a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Document loading failed: {0}")]
    Documents(#[from] DocumentError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Guardrail evaluation failed: {0}")]
    Evaluation(#[from] SchemaViolation),

    #[error("Audit log failed: {0}")]
    AuditLog(#[from] AuditLogError),
}

/// Everything produced by one pipeline run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutcome {
    pub patient_id: String,
    pub mode: ExtractionMode,
    pub extracted_data: ExtractedRecord,
    pub audit_file: PathBuf,
    pub completion: CompletionSummary,
    pub report: GuardrailReport,
    pub digest: ReportDigest,
    pub checked_at: DateTime<Utc>,
}

pub struct Pipeline {
    store: Arc<dyn DocumentStore>,
    extractor: Arc<dyn Extractor>,
    writer: AuditWriter,
    config: RuntimeConfig,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        extractor: Arc<dyn Extractor>,
        config: RuntimeConfig,
    ) -> Self {
        let writer = AuditWriter::new(&config.audit_dir);
        Self {
            store,
            extractor,
            writer,
            config,
        }
    }

    /// Build a pipeline over a document directory with the configured extractor.
    pub fn from_config(config: RuntimeConfig) -> Result<Self, PipelineError> {
        let store = Arc::new(DirectoryStore::new(&config.documents_dir));
        let extractor: Arc<dyn Extractor> = match config.extraction.kind {
            ExtractorKind::Fixture => Arc::new(FixtureExtractor::new(&config.fixtures_dir)),
            #[cfg(feature = "http")]
            ExtractorKind::Http => Arc::new(crate::providers::HttpExtractor::from_config(
                &config.extraction,
            )?),
            #[cfg(not(feature = "http"))]
            ExtractorKind::Http => {
                return Err(ExtractionError::NotConfigured(
                    "http extractor requires the 'http' feature".to_string(),
                )
                .into())
            }
        };
        Ok(Self::new(store, extractor, config))
    }

    /// Run the pipeline for one patient.
    pub async fn run(
        &self,
        patient_id: &str,
        staging: StagingConfirmation,
    ) -> Result<PipelineOutcome, PipelineError> {
        if patient_id.trim().is_empty() {
            return Err(DocumentError::EmptyPatientId.into());
        }

        let documents = self.store.load(patient_id).await?;
        tracing::info!(patient_id, documents = documents.len(), "Loaded patient documents");

        let record = self.extract_with_retry(&documents).await?;

        let audit = AuditTrailBuilder::with_sources(self.config.sources.clone()).build(&record)?;
        let checked_at = Utc::now();

        let log = AuditLog::new(patient_id, self.extractor.mode(), audit.clone(), checked_at);
        let audit_file = self.writer.save(&log).await?;

        let report = GuardrailEngine::new(staging).apply(&record, &audit.entries)?;
        let digest = report.digest();
        tracing::info!(
            patient_id,
            safe = digest.fields_safe_to_populate,
            needs_review = digest.fields_needing_review,
            action_required = digest.action_required,
            "Pipeline complete"
        );

        Ok(PipelineOutcome {
            patient_id: patient_id.to_string(),
            mode: self.extractor.mode(),
            extracted_data: record,
            audit_file,
            completion: audit.summary,
            report,
            digest,
            checked_at,
        })
    }

    /// Extract with a per-attempt timeout, retrying transient failures with
    /// exponential backoff.
    async fn extract_with_retry(
        &self,
        documents: &PatientDocuments,
    ) -> Result<ExtractedRecord, ExtractionError> {
        let settings = &self.config.extraction;
        let timeout = settings.timeout;
        let extractor = &self.extractor;

        let attempt = || async move {
            match tokio::time::timeout(timeout, extractor.extract(documents)).await {
                Ok(result) => result,
                Err(_) => Err(ExtractionError::Timeout(timeout)),
            }
        };

        attempt
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(settings.initial_backoff)
                    .with_max_times(settings.max_retries),
            )
            .sleep(tokio::time::sleep)
            .when(ExtractionError::is_retryable)
            .notify(|err: &ExtractionError, delay: Duration| {
                tracing::warn!(
                    extractor = extractor.name(),
                    error = %err,
                    retry_in = ?delay,
                    "Extraction attempt failed, retrying"
                );
            })
            .await
    }
}
