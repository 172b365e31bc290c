/// Object storage abstraction (S3-compatible, local directory, in-memory)
pub mod local;
pub mod memory;
pub mod s3;

pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Result, SyncError};
use crate::types::{Config, ExistingObject, StorageBackend, StoredObject};

/// Flat key/value blob store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create or overwrite the object at `key`
    async fn put(&self, key: &str, content: Vec<u8>, content_type: Option<&str>) -> Result<()>;

    /// Read the object at `key`; `Ok(None)` when it does not exist
    async fn get(&self, key: &str) -> Result<Option<StoredObject>>;

    /// Classify the destination key ahead of a conditional write
    async fn lookup(&self, key: &str) -> ExistingObject {
        match self.get(key).await {
            Ok(Some(object)) => ExistingObject::Found(object.hash),
            Ok(None) => ExistingObject::NotFound,
            Err(e) => ExistingObject::TransientError(e.to_string()),
        }
    }

    /// Read an object that must exist
    async fn get_required(&self, key: &str) -> Result<StoredObject> {
        self.get(key)
            .await?
            .ok_or_else(|| SyncError::ObjectNotFound(key.to_string()))
    }
}

/// Reject keys that could escape a prefix or a local root
pub fn validate_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(SyncError::InvalidKey("object key is empty".to_string()));
    }
    if key.starts_with('/') {
        return Err(SyncError::InvalidKey(format!("'{}' must not start with '/'", key)));
    }
    if key.contains('\\') {
        return Err(SyncError::InvalidKey(format!("'{}' must not contain '\\'", key)));
    }
    if key.split('/').any(|seg| seg == "..") {
        return Err(SyncError::InvalidKey(format!("'{}' must not contain '..' segments", key)));
    }
    Ok(())
}

/// Build the store selected by `storage_backend`
pub async fn open_store(config: &Config) -> Result<Arc<dyn ObjectStore>> {
    let store: Arc<dyn ObjectStore> = match config.storage_backend {
        StorageBackend::S3 => Arc::new(S3ObjectStore::new(config).await?),
        StorageBackend::Local => Arc::new(LocalObjectStore::new(&config.local_storage_root)),
        StorageBackend::Memory => Arc::new(MemoryObjectStore::new()),
    };
    Ok(store)
}
