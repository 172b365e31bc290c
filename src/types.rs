/// Core type definitions for the sync pipeline
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file discovered in a remote directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileRef {
    pub name: String,
    pub url: String,
}

/// A named blob in object storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub content: Vec<u8>,
    pub content_type: Option<String>,
    pub hash: String,
}

impl StoredObject {
    pub fn new(key: impl Into<String>, content: Vec<u8>, content_type: Option<String>) -> Self {
        let hash = crate::utils::content_hash(&content);
        StoredObject {
            key: key.into(),
            content,
            content_type,
            hash,
        }
    }
}

/// State of the destination key before a conditional write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExistingObject {
    Found(String),
    NotFound,
    TransientError(String),
}

/// Result of syncing a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Updated,
    Unchanged,
}

impl SyncOutcome {
    pub fn as_str(&self) -> &str {
        match self {
            SyncOutcome::Updated => "updated",
            SyncOutcome::Unchanged => "unchanged",
        }
    }
}

/// Response of one ingest run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub status: String,
    pub files_uploaded_or_updated: usize,
    pub api_exported: bool,
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Summary statistics over the population series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub mean_pop: f64,
    /// Sample standard deviation; `None` when only one row falls in range
    pub std_pop: Option<f64>,
    pub rows: usize,
    pub start_year: i64,
    pub end_year: i64,
}

/// Shape of the tab-delimited time series file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelimitedSummary {
    pub columns: Vec<String>,
    pub rows: usize,
}

/// One normalized row of the population payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationRow {
    pub year: i64,
    pub population: f64,
}

/// Where objects are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Local,
    Memory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &str {
        match self {
            StorageBackend::S3 => "s3",
            StorageBackend::Local => "local",
            StorageBackend::Memory => "memory",
        }
    }
}

/// Configuration for the sync pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Storage
    pub storage_backend: StorageBackend,
    pub bucket_name: String,
    pub aws_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub local_storage_root: String,

    // Remote Sources
    pub bls_url: String,
    pub api_url: String,
    pub user_agent: String,

    // Object Naming
    pub bls_prefix: String,
    pub api_prefix: String,
    pub json_file_name: String,
    pub bls_data_file: String,

    // HTTP
    pub listing_timeout_secs: u64,
    pub download_timeout_secs: u64,

    // Concurrency
    pub max_concurrent_downloads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage_backend: StorageBackend::S3,
            bucket_name: String::new(),
            aws_region: None,
            s3_endpoint: None,
            local_storage_root: "data/objects".to_string(),
            bls_url: "https://download.bls.gov/pub/time.series/pr/".to_string(),
            api_url: String::new(),
            user_agent: "Mozilla/5.0 (compatible; DataSyncBot/1.0)".to_string(),
            bls_prefix: "bls-data/".to_string(),
            api_prefix: "api-data/".to_string(),
            json_file_name: "population.json".to_string(),
            bls_data_file: "pr.data.0.Current".to_string(),
            listing_timeout_secs: 60,
            download_timeout_secs: 120,
            max_concurrent_downloads: 1,
        }
    }
}

impl Config {
    pub fn bls_key(&self, file_name: &str) -> String {
        format!("{}{}", self.bls_prefix, file_name)
    }

    pub fn api_key(&self) -> String {
        format!("{}{}", self.api_prefix, self.json_file_name)
    }

    pub fn bls_data_key(&self) -> String {
        self.bls_key(&self.bls_data_file)
    }

    /// API export is a no-op when no source URL is configured
    pub fn api_export_enabled(&self) -> bool {
        !self.api_url.trim().is_empty()
    }
}
