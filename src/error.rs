/// Centralized error types for the sync pipeline
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    // Fetch Errors
    #[error("Fetch failed: {url} returned HTTP {status}")]
    Fetch { url: String, status: u16 },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    // Parse Errors
    #[error("Parse failed: {0}")]
    Parse(String),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Delimited parsing failed: {0}")]
    Csv(#[from] csv::Error),

    // Aggregation Errors
    #[error("No rows in year range {start_year}-{end_year}")]
    EmptyResult { start_year: i64, end_year: i64 },

    // Storage Errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration Errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// Coarse error classes reported upward to the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Fetch,
    Parse,
    EmptyResult,
    Storage,
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorKind::Fetch => "FetchError",
            ErrorKind::Parse => "ParseError",
            ErrorKind::EmptyResult => "EmptyResultError",
            ErrorKind::Storage => "StorageError",
            ErrorKind::Config => "ConfigError",
        }
    }
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Fetch { .. } | SyncError::Http(_) | SyncError::InvalidUrl(_) => {
                ErrorKind::Fetch
            }
            SyncError::Parse(_) | SyncError::Json(_) | SyncError::Csv(_) => ErrorKind::Parse,
            SyncError::EmptyResult { .. } => ErrorKind::EmptyResult,
            SyncError::Storage(_)
            | SyncError::ObjectNotFound(_)
            | SyncError::InvalidKey(_)
            | SyncError::Io(_) => ErrorKind::Storage,
            SyncError::Config(_) => ErrorKind::Config,
        }
    }

    /// Get error code for logging/monitoring
    pub fn error_code(&self) -> &str {
        match self {
            SyncError::Fetch { .. } => "NET_001",
            SyncError::Http(_) => "NET_002",
            SyncError::InvalidUrl(_) => "NET_003",
            SyncError::Parse(_) => "DATA_001",
            SyncError::Json(_) => "DATA_002",
            SyncError::Csv(_) => "DATA_003",
            SyncError::EmptyResult { .. } => "AGG_001",
            SyncError::Storage(_) => "STORE_001",
            SyncError::ObjectNotFound(_) => "STORE_002",
            SyncError::InvalidKey(_) => "STORE_003",
            SyncError::Io(_) => "FILE_001",
            SyncError::Config(_) => "CFG_001",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err = SyncError::Fetch {
            url: "https://example.com/x".to_string(),
            status: 404,
        };
        assert_eq!(err.kind(), ErrorKind::Fetch);
        assert_eq!(err.error_code(), "NET_001");
        assert!(err.to_string().contains("404"));

        let err = SyncError::EmptyResult {
            start_year: 2013,
            end_year: 2018,
        };
        assert_eq!(err.kind().as_str(), "EmptyResultError");

        let err: SyncError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }
}
