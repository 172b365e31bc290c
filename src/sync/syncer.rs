/// Content syncer: download listed files and write only those whose hash changed
use std::sync::Arc;
use std::time::Duration;

use futures_util::{StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::remote::{Fetcher, RemoteLister};
use crate::storage::ObjectStore;
use crate::types::{Config, ExistingObject, RemoteFileRef, SyncOutcome};
use crate::utils::{content_hash, KeyLocks};

pub struct ContentSyncer {
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn ObjectStore>,
    config: Arc<Config>,
    lister: RemoteLister,
    locks: KeyLocks,
}

impl ContentSyncer {
    pub fn new(fetcher: Arc<dyn Fetcher>, store: Arc<dyn ObjectStore>, config: Arc<Config>) -> Self {
        let lister = RemoteLister::new(
            Arc::clone(&fetcher),
            Duration::from_secs(config.listing_timeout_secs),
        );

        ContentSyncer {
            fetcher,
            store,
            config,
            lister,
            locks: KeyLocks::new(),
        }
    }

    /// List `bls_url` and sync every file it links to.
    /// Returns the number of objects uploaded or updated.
    pub async fn sync_all(&self) -> Result<usize> {
        info!("Syncing {} -> {}", self.config.bls_url, self.config.bls_prefix);
        let files = self.lister.list(&self.config.bls_url).await?;
        self.sync_files(files).await
    }

    /// Sync the given files with at most `max_concurrent_downloads` in flight.
    /// The first failure aborts the rest of the batch.
    pub async fn sync_files<I>(&self, files: I) -> Result<usize>
    where
        I: IntoIterator<Item = RemoteFileRef>,
    {
        let limit = self.config.max_concurrent_downloads.max(1);

        let collected: Result<Vec<SyncOutcome>> = futures_util::stream::iter(files)
            .map(|file| async move { self.sync_file(&file).await })
            .buffer_unordered(limit)
            .try_collect()
            .await;
        self.locks.prune().await;
        let outcomes = collected?;

        let updated = outcomes.iter().filter(|o| **o == SyncOutcome::Updated).count();
        info!(
            "Sync finished: {} updated, {} unchanged",
            updated,
            outcomes.len() - updated
        );

        Ok(updated)
    }

    /// Download one file and store it if its content changed
    pub async fn sync_file(&self, file: &RemoteFileRef) -> Result<SyncOutcome> {
        let key = self.config.bls_key(&file.name);
        let timeout = Duration::from_secs(self.config.download_timeout_secs);

        let response = self.fetcher.get(&file.url, timeout).await?.error_for_status()?;
        let outcome = self
            .upload_if_changed(&key, response.body.to_vec(), response.content_type.as_deref())
            .await?;

        match outcome {
            SyncOutcome::Updated => info!("{}: {}", outcome.as_str(), file.name),
            SyncOutcome::Unchanged => debug!("{}: {}", outcome.as_str(), file.name),
        }

        Ok(outcome)
    }

    /// Compare the content hash with the stored object and overwrite on change.
    ///
    /// A lookup that fails for any reason other than absence is treated as
    /// absence: the object is written.
    pub async fn upload_if_changed(
        &self,
        key: &str,
        content: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<SyncOutcome> {
        let _guard = self.locks.acquire(key).await;

        let new_hash = content_hash(&content);

        match self.store.lookup(key).await {
            ExistingObject::Found(old_hash) if old_hash == new_hash => {
                return Ok(SyncOutcome::Unchanged);
            }
            ExistingObject::Found(_) => debug!("{} changed", key),
            ExistingObject::NotFound => debug!("{} not stored yet", key),
            ExistingObject::TransientError(e) => {
                warn!("Lookup of {} failed ({}); writing anyway", key, e)
            }
        }

        self.store.put(key, content, content_type).await?;
        Ok(SyncOutcome::Updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::remote::StaticFetcher;
    use crate::storage::MemoryObjectStore;
    use crate::types::StoredObject;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const BASE: &str = "https://download.bls.gov/pub/time.series/pr/";

    fn test_config(max_concurrent_downloads: usize) -> Arc<Config> {
        Arc::new(Config {
            storage_backend: crate::types::StorageBackend::Memory,
            max_concurrent_downloads,
            ..Config::default()
        })
    }

    async fn serve_files(fetcher: &StaticFetcher, files: &[(&str, &str)]) {
        let mut index = String::from("<html><body><pre>\n<a href=\"/pub/time.series/\">[To Parent Directory]</a>\n");
        for (name, body) in files {
            index.push_str(&format!("<a href=\"/pub/time.series/pr/{0}\">{0}</a>\n", name));
            fetcher
                .respond_ok(&format!("{}{}", BASE, name), Some("text/plain"), body.to_string())
                .await;
        }
        index.push_str("</pre></body></html>");
        fetcher.respond_ok(BASE, Some("text/html"), index).await;
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let fetcher = Arc::new(StaticFetcher::new());
        let store = Arc::new(MemoryObjectStore::new());
        serve_files(
            &fetcher,
            &[
                ("pr.class", "class_code\tclass_text\n"),
                ("pr.duration", "duration_code\tduration_text\n"),
                ("pr.data.0.Current", "series_id\tyear\tperiod\tvalue\n"),
            ],
        )
        .await;

        let syncer = ContentSyncer::new(fetcher.clone(), store.clone(), test_config(1));

        assert_eq!(syncer.sync_all().await.unwrap(), 3);
        assert_eq!(syncer.sync_all().await.unwrap(), 0);
        assert_eq!(store.write_count(), 3);
        assert_eq!(
            store.keys().await,
            vec!["bls-data/pr.class", "bls-data/pr.data.0.Current", "bls-data/pr.duration"]
        );
    }

    #[tokio::test]
    async fn test_reports_exactly_changed_files() {
        let fetcher = Arc::new(StaticFetcher::new());
        let store = Arc::new(MemoryObjectStore::new());
        let files = [("a.txt", "a1"), ("b.txt", "b1"), ("c.txt", "c1"), ("d.txt", "d1")];
        serve_files(&fetcher, &files).await;

        let syncer = ContentSyncer::new(fetcher.clone(), store.clone(), test_config(1));
        assert_eq!(syncer.sync_all().await.unwrap(), 4);

        serve_files(&fetcher, &[("a.txt", "a2"), ("b.txt", "b1"), ("c.txt", "c2"), ("d.txt", "d1")]).await;
        assert_eq!(syncer.sync_all().await.unwrap(), 2);

        let a = store.get("bls-data/a.txt").await.unwrap().unwrap();
        assert_eq!(a.content, b"a2".to_vec());
    }

    #[tokio::test]
    async fn test_concurrent_sync_keeps_invariant() {
        let fetcher = Arc::new(StaticFetcher::new());
        let store = Arc::new(MemoryObjectStore::new());
        let files: Vec<(String, String)> = (0..12)
            .map(|i| (format!("pr.file{}", i), format!("content {}", i)))
            .collect();
        let borrowed: Vec<(&str, &str)> = files.iter().map(|(n, b)| (n.as_str(), b.as_str())).collect();
        serve_files(&fetcher, &borrowed).await;

        let syncer = ContentSyncer::new(fetcher.clone(), store.clone(), test_config(4));
        assert_eq!(syncer.sync_all().await.unwrap(), 12);
        assert_eq!(syncer.sync_all().await.unwrap(), 0);
        assert_eq!(store.write_count(), 12);
        assert_eq!(syncer.locks.len().await, 0);
    }

    #[tokio::test]
    async fn test_failed_download_aborts_batch() {
        let fetcher = Arc::new(StaticFetcher::new());
        let store = Arc::new(MemoryObjectStore::new());
        serve_files(&fetcher, &[("a.txt", "a"), ("b.txt", "b")]).await;
        fetcher
            .respond(&format!("{}a.txt", BASE), 500, Some("text/plain"), "boom")
            .await;

        let syncer = ContentSyncer::new(fetcher.clone(), store.clone(), test_config(1));
        let err = syncer.sync_all().await.unwrap_err();

        assert!(matches!(err, SyncError::Fetch { status: 500, .. }));
        assert_eq!(store.write_count(), 0);
    }

    /// Store whose reads always fail while writes succeed
    struct UnreadableStore {
        puts: AtomicUsize,
    }

    #[async_trait]
    impl ObjectStore for UnreadableStore {
        async fn put(&self, _key: &str, _content: Vec<u8>, _content_type: Option<&str>) -> Result<()> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn get(&self, _key: &str) -> Result<Option<StoredObject>> {
            Err(SyncError::Storage("503 SlowDown".to_string()))
        }
    }

    #[tokio::test]
    async fn test_transient_lookup_error_writes() {
        let fetcher = Arc::new(StaticFetcher::new());
        let store = Arc::new(UnreadableStore {
            puts: AtomicUsize::new(0),
        });

        let syncer = ContentSyncer::new(fetcher, store.clone(), test_config(1));
        let outcome = syncer
            .upload_if_changed("bls-data/pr.class", b"x".to_vec(), None)
            .await
            .unwrap();

        assert_eq!(outcome, SyncOutcome::Updated);
        assert_eq!(store.puts.load(Ordering::SeqCst), 1);
    }
}
