/// Directory-backed object store for local runs
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::storage::{validate_key, ObjectStore};
use crate::types::StoredObject;

/// Stores each object as a file under `root`, keyed by its relative path.
/// Content types are kept in a `.content-type` sidecar next to the object.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        LocalObjectStore {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn content_type_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.content-type", key))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, content: Vec<u8>, content_type: Option<&str>) -> Result<()> {
        validate_key(key)?;

        let path = self.object_path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Readers never see a partially written object
        let mut tmp = path.clone().into_os_string();
        tmp.push(".partial");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, &content).await?;
        tokio::fs::rename(&tmp, &path).await?;

        let ct_path = self.content_type_path(key);
        match content_type {
            Some(ct) => tokio::fs::write(&ct_path, ct).await?,
            None => {
                if ct_path.exists() {
                    tokio::fs::remove_file(&ct_path).await?;
                }
            }
        }

        debug!("[local] put {} ({} bytes)", path.display(), content.len());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<StoredObject>> {
        validate_key(key)?;

        let path = self.object_path(key);
        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let content_type = tokio::fs::read_to_string(self.content_type_path(key)).await.ok();

        Ok(Some(StoredObject::new(key, content, content_type)))
    }
}
