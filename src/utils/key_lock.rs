/// Per-key write serialization
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Hands out one async mutex per storage key so that the
/// lookup-compare-write sequence for a key runs with a single writer.
#[derive(Default)]
pub struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        KeyLocks {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Wait until the key is free, then hold it until the guard drops
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(
                locks
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        lock.lock_owned().await
    }

    /// Drop locks nobody holds or waits on; the map only keeps keys in use
    pub async fn prune(&self) {
        let mut locks = self.locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    /// Number of keys currently tracked
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_serialized() {
        let locks = Arc::new(KeyLocks::new());

        let guard = locks.acquire("bls-data/pr.class").await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire("bls-data/pr.class").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let locks = KeyLocks::new();

        let _a = locks.acquire("bls-data/a").await;
        let _b = tokio::time::timeout(Duration::from_millis(100), locks.acquire("bls-data/b"))
            .await
            .expect("distinct key should not block");

        assert_eq!(locks.len().await, 2);
    }

    #[tokio::test]
    async fn test_prune_keeps_only_held_keys() {
        let locks = KeyLocks::new();

        let held = locks.acquire("bls-data/held").await;
        drop(locks.acquire("bls-data/released").await);
        assert_eq!(locks.len().await, 2);

        locks.prune().await;
        assert_eq!(locks.len().await, 1);

        drop(held);
        locks.prune().await;
        assert_eq!(locks.len().await, 0);
    }
}
