//! Runtime configuration.
//!
//! Loaded from YAML. Durations are human-readable (`"30s"`, `"500ms"`).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use registry_guard_core::SourceMap;

/// Errors from loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Which extractor the pipeline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    /// Pre-extracted records read from the fixtures directory
    Fixture,
    /// Remote extraction service
    Http,
}

/// Extraction service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub kind: ExtractorKind,

    /// Budget for a single extraction attempt
    #[serde(with = "humantime_duration")]
    pub timeout: Duration,

    /// Retries after the first failed attempt
    pub max_retries: usize,

    /// Delay before the first retry; doubles on each further retry
    #[serde(with = "humantime_duration")]
    pub initial_backoff: Duration,

    /// Endpoint of the remote extraction service
    pub endpoint: Option<String>,

    /// Environment variable holding the extraction service API key
    pub api_key_env: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            kind: ExtractorKind::Fixture,
            timeout: Duration::from_secs(60),
            max_retries: 2,
            initial_backoff: Duration::from_millis(500),
            endpoint: None,
            api_key_env: "EXTRACTION_API_KEY".to_string(),
        }
    }
}

/// Configuration for the abstraction pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Directory holding `<patient_id>_<doc_type>.txt` documents
    pub documents_dir: PathBuf,

    /// Directory holding `<patient_id>.json` pre-extracted records
    pub fixtures_dir: PathBuf,

    /// Directory audit logs are written to
    pub audit_dir: PathBuf,

    /// Source-document category per section
    pub sources: SourceMap,

    pub extraction: ExtractionConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            documents_dir: PathBuf::from("data/patients"),
            fixtures_dir: PathBuf::from("data/extracted"),
            audit_dir: PathBuf::from("audit"),
            sources: SourceMap::canonical(),
            extraction: ExtractionConfig::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }
}

mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}
