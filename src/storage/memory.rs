/// In-process object store (dry runs and offline replays)
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::storage::{validate_key, ObjectStore};
use crate::types::StoredObject;

/// Object store backed by a map; counts writes so callers can verify idempotence
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, StoredObject>>,
    writes: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        MemoryObjectStore {
            objects: RwLock::new(HashMap::new()),
            writes: AtomicUsize::new(0),
        }
    }

    /// Total number of `put` calls that succeeded
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn keys(&self) -> Vec<String> {
        let objects = self.objects.read().await;
        let mut keys: Vec<String> = objects.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, content: Vec<u8>, content_type: Option<&str>) -> Result<()> {
        validate_key(key)?;

        let object = StoredObject::new(key, content, content_type.map(str::to_string));
        debug!("[memory] put {} ({} bytes)", key, object.content.len());

        let mut objects = self.objects.write().await;
        objects.insert(key.to_string(), object);
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<StoredObject>> {
        validate_key(key)?;
        let objects = self.objects.read().await;
        Ok(objects.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_and_write_count() {
        let store = MemoryObjectStore::new();
        let content = b"series_id\tyear\nPRS30006011\t1995\n".to_vec();

        store.put("bls-data/pr.data.0.Current", content.clone(), None).await.unwrap();
        store.put("bls-data/pr.data.0.Current", content.clone(), None).await.unwrap();

        let object = store.get("bls-data/pr.data.0.Current").await.unwrap().unwrap();
        assert_eq!(object.content, content);
        assert_eq!(object.hash, crate::utils::content_hash(&content));
        assert_eq!(store.write_count(), 2);
        assert_eq!(store.len().await, 1);
    }
}
