/// Configuration loading from an optional TOML file layered under environment variables
use std::path::Path;

use config::{Environment, File, FileFormat};
use tracing::debug;

use crate::error::{Result, SyncError};
use crate::types::{Config, StorageBackend};

/// Environment variable naming the config file
pub const CONFIG_PATH_VAR: &str = "STATSYNC_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "statsync.toml";

/// Load config from `$STATSYNC_CONFIG` (or `statsync.toml`) plus the environment
pub fn load_config_from_env() -> Result<Config> {
    let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_config(path)
}

/// Build the config: defaults, then the TOML file if present, then environment
/// variables (`BUCKET_NAME`, `BLS_URL`, `API_URL`, ...).
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    debug!("Loading configuration (file: {})", path.display());

    let layered = config::Config::builder()
        .add_source(
            File::from(path)
                .format(FileFormat::Toml)
                .required(false),
        )
        .add_source(Environment::default().try_parsing(true))
        .build()
        .map_err(|e| SyncError::Config(format!("Failed to read config: {}", e)))?;

    let config: Config = layered
        .try_deserialize()
        .map_err(|e| SyncError::Config(format!("Failed to parse config: {}", e)))?;

    validate_config(&config)?;

    Ok(config)
}

/// Parse config from TOML text alone (no environment layering)
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)
        .map_err(|e| SyncError::Config(format!("Failed to parse config: {}", e)))?;

    validate_config(&config)?;

    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<()> {
    if config.storage_backend == StorageBackend::S3 && config.bucket_name.trim().is_empty() {
        return Err(SyncError::Config(
            "bucket_name is required for the s3 storage backend".to_string(),
        ));
    }

    if config.storage_backend == StorageBackend::Local && config.local_storage_root.trim().is_empty() {
        return Err(SyncError::Config("local_storage_root is empty".to_string()));
    }

    url::Url::parse(&config.bls_url)
        .map_err(|e| SyncError::Config(format!("Invalid bls_url '{}': {}", config.bls_url, e)))?;

    if config.api_export_enabled() {
        url::Url::parse(&config.api_url)
            .map_err(|e| SyncError::Config(format!("Invalid api_url '{}': {}", config.api_url, e)))?;
    }

    if config.json_file_name.trim().is_empty() {
        return Err(SyncError::Config("json_file_name is empty".to_string()));
    }

    if config.max_concurrent_downloads == 0 {
        return Err(SyncError::Config("max_concurrent_downloads must be >= 1".to_string()));
    }

    if config.listing_timeout_secs == 0 || config.download_timeout_secs == 0 {
        return Err(SyncError::Config("HTTP timeouts must be > 0".to_string()));
    }

    Ok(())
}
