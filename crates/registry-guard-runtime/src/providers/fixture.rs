//! Pre-extracted records read from disk.
//!
//! Used for demos and tests: `<dir>/<patient_id>.json` holds the record the
//! extraction service would have produced.

use async_trait::async_trait;
use std::path::PathBuf;

use registry_guard_core::ExtractedRecord;

use super::{parse_extraction_output, ExtractionError, ExtractionMode, Extractor};
use crate::documents::PatientDocuments;

#[derive(Debug, Clone)]
pub struct FixtureExtractor {
    dir: PathBuf,
}

impl FixtureExtractor {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn fixture_path(&self, patient_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", patient_id))
    }
}

#[async_trait]
impl Extractor for FixtureExtractor {
    async fn extract(&self, documents: &PatientDocuments) -> Result<ExtractedRecord, ExtractionError> {
        let path = self.fixture_path(&documents.patient_id);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ExtractionError::FixtureMissing(documents.patient_id.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), "Loaded pre-extracted record");
        parse_extraction_output(&documents.patient_id, &raw)
    }

    fn mode(&self) -> ExtractionMode {
        ExtractionMode::Mock
    }

    fn name(&self) -> &str {
        "fixture"
    }
}
