//! Remote extraction service client.
//!
//! Sends the extraction prompt to an HTTP endpoint and parses the raw JSON
//! text it replies with.
//!
//! ## Security
//!
//! The API key is held in an [`ApiCredential`] and exposed only when the
//! bearer header is set.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use registry_guard_core::ExtractedRecord;

use super::secrets::ApiCredential;
use super::{parse_extraction_output, ExtractionError, ExtractionMode, Extractor};
use crate::config::ExtractionConfig;
use crate::documents::PatientDocuments;
use crate::prompts::build_extraction_prompt;

pub struct HttpExtractor {
    credential: ApiCredential,
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpExtractor")
            .field("credential", &self.credential)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct ExtractionRequest<'a> {
    patient_id: &'a str,
    prompt: String,
}

impl HttpExtractor {
    pub fn new(
        endpoint: impl Into<String>,
        credential: ApiCredential,
        timeout: Duration,
    ) -> Result<Self, ExtractionError> {
        let endpoint = endpoint.into();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ExtractionError::NotConfigured(
                "endpoint must start with http:// or https://".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractionError::NotConfigured(e.to_string()))?;

        Ok(Self {
            credential,
            endpoint,
            timeout,
            client,
        })
    }

    /// Build from configuration, reading the API key from the configured
    /// environment variable.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ExtractionError> {
        let endpoint = config.endpoint.as_deref().ok_or_else(|| {
            ExtractionError::NotConfigured("extraction.endpoint is required".to_string())
        })?;
        let credential = ApiCredential::from_env(&config.api_key_env, "Extraction API key")?;
        Self::new(endpoint, credential, config.timeout)
    }
}

#[async_trait]
impl Extractor for HttpExtractor {
    async fn extract(&self, documents: &PatientDocuments) -> Result<ExtractedRecord, ExtractionError> {
        let request = ExtractionRequest {
            patient_id: &documents.patient_id,
            prompt: build_extraction_prompt(documents),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.credential.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractionError::Timeout(self.timeout)
                } else {
                    ExtractionError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ExtractionError::RateLimited);
        }

        let body = response
            .text()
            .await
            .map_err(|e| ExtractionError::HttpError(e.to_string()))?;

        if !status.is_success() {
            return Err(ExtractionError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        parse_extraction_output(&documents.patient_id, &body)
    }

    fn mode(&self) -> ExtractionMode {
        ExtractionMode::Live
    }

    fn name(&self) -> &str {
        "http"
    }
}
