//! Patient document loading.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from document stores.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("No documents found for patient {0}")]
    NotFound(String),

    #[error("Patient id must not be empty")]
    EmptyPatientId,

    #[error("Failed to read documents: {0}")]
    IoError(#[from] std::io::Error),
}

/// Raw documents for one patient, keyed by document type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientDocuments {
    pub patient_id: String,

    /// Document type (e.g. `md_note_visit1`, `pathology`) to text
    pub documents: BTreeMap<String, String>,
}

impl PatientDocuments {
    pub fn new(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            documents: BTreeMap::new(),
        }
    }

    pub fn with_document(mut self, doc_type: impl Into<String>, content: impl Into<String>) -> Self {
        self.documents.insert(doc_type.into(), content.into());
        self
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Source of raw patient documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load every document for a patient.
    async fn load(&self, patient_id: &str) -> Result<PatientDocuments, DocumentError>;
}

/// Reads `*.txt` documents from a directory.
///
/// A file belongs to a patient when its name contains the patient id; the
/// document type is the file stem with the `<patient_id>_` prefix removed.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DocumentStore for DirectoryStore {
    async fn load(&self, patient_id: &str) -> Result<PatientDocuments, DocumentError> {
        // An empty id would match every file in the directory
        if patient_id.trim().is_empty() {
            return Err(DocumentError::EmptyPatientId);
        }

        let mut documents = PatientDocuments::new(patient_id);
        let prefix = format!("{}_", patient_id);

        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !stem.contains(patient_id) {
                continue;
            }

            let doc_type = stem.strip_prefix(&prefix).unwrap_or(stem).to_string();
            let content = tokio::fs::read_to_string(&path).await?;
            tracing::debug!(patient_id, doc_type = %doc_type, bytes = content.len(), "Loaded document");
            documents.documents.insert(doc_type, content);
        }

        if documents.is_empty() {
            return Err(DocumentError::NotFound(patient_id.to_string()));
        }

        Ok(documents)
    }
}
