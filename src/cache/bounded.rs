//! Thread-safe bounded expiring cache
//!
//! Wraps [`CacheStore`] in a single async mutex shared with the janitor task.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{CacheStats, CacheStore};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::session::{FastCache, Turn};
use crate::tasks::spawn_cleanup_task;

// == Bounded Expiring Cache ==
/// Process-wide cache with LRU eviction and a background expiry janitor.
///
/// Every operation, janitor sweeps included, runs inside one exclusive
/// section per cache instance. The janitor lives from [`new`](Self::new)
/// until [`shutdown`](Self::shutdown) or drop.
#[derive(Debug)]
pub struct BoundedExpiringCache<V> {
    store: Arc<Mutex<CacheStore<V>>>,
    janitor: StdMutex<Option<JoinHandle<()>>>,
}

impl<V> BoundedExpiringCache<V>
where
    V: Clone + Send + 'static,
{
    /// Creates the cache and starts its janitor. Must be called inside a tokio runtime.
    pub fn new(config: &CacheConfig) -> Self {
        let store = Arc::new(Mutex::new(CacheStore::new(
            config.capacity,
            config.expiry_time,
        )));
        let janitor = spawn_cleanup_task(store.clone(), config.cleanup_interval);

        info!(
            capacity = config.capacity,
            expiry_secs = config.expiry_time.as_secs(),
            "Session cache initialized"
        );

        Self {
            store,
            janitor: StdMutex::new(Some(janitor)),
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        self.store.lock().await.get(key)
    }

    pub async fn put(&self, key: impl Into<String>, value: V) {
        let evicted = self.store.lock().await.put(key.into(), value);
        if let Some(victim) = evicted {
            debug!(key = %victim, "Evicted least recently used session");
        }
    }

    /// Inserts with a per-entry idle TTL, clamped to the configured expiry.
    pub async fn put_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let evicted = self.store.lock().await.put_with_ttl(key.into(), value, ttl);
        if let Some(victim) = evicted {
            debug!(key = %victim, "Evicted least recently used session");
        }
    }

    /// Removes an entry. Returns whether it was resident.
    pub async fn invalidate(&self, key: &str) -> bool {
        self.store.lock().await.delete(key)
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.lock().await.stats()
    }

    pub async fn len(&self) -> usize {
        self.store.lock().await.len()
    }

    /// Checks residency without refreshing the entry.
    pub async fn contains(&self, key: &str) -> bool {
        self.store.lock().await.contains(key)
    }

    /// Stops the janitor. Cached data stays readable until drop.
    pub fn shutdown(&self) {
        let handle = match self.janitor.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            handle.abort();
            info!("Session cache janitor stopped");
        }
    }

    /// Whether the janitor task is still running.
    pub fn janitor_running(&self) -> bool {
        match self.janitor.lock() {
            Ok(guard) => guard.as_ref().is_some_and(|handle| !handle.is_finished()),
            Err(_) => false,
        }
    }
}

impl<V> Drop for BoundedExpiringCache<V> {
    fn drop(&mut self) {
        let slot = match self.janitor.get_mut() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl FastCache for BoundedExpiringCache<Vec<Turn>> {
    async fn get(&self, key: &str) -> Result<Option<Vec<Turn>>> {
        Ok(BoundedExpiringCache::get(self, key).await)
    }

    async fn set(&self, key: &str, value: Vec<Turn>, ttl: Duration) -> Result<()> {
        self.put_with_ttl(key, value, ttl).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.invalidate(key).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(capacity: usize, expiry_ms: u64, cleanup_ms: u64) -> CacheConfig {
        CacheConfig {
            capacity,
            expiry_time: Duration::from_millis(expiry_ms),
            cleanup_interval: Duration::from_millis(cleanup_ms),
        }
    }

    #[tokio::test]
    async fn test_put_get_and_invalidate() {
        let cache = BoundedExpiringCache::new(&config(10, 60_000, 60_000));

        cache.put("s1", vec![Turn::user("hello")]).await;

        assert_eq!(cache.get("s1").await, Some(vec![Turn::user("hello")]));
        assert!(cache.invalidate("s1").await);
        assert_eq!(cache.get("s1").await, None);
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_used() {
        let cache = BoundedExpiringCache::new(&config(2, 60_000, 60_000));

        cache.put("a", 1).await;
        cache.put("b", 2).await;
        cache.get("a").await;
        cache.put("c", 3).await;

        assert!(cache.contains("a").await);
        assert!(!cache.contains("b").await);
        assert!(cache.contains("c").await);
        assert_eq!(cache.stats().await.evictions, 1);
    }

    #[tokio::test]
    async fn test_janitor_expires_untouched_entries() {
        let cache = BoundedExpiringCache::new(&config(10, 100, 50));

        cache.put("idle", 1).await;

        // expiry + one cleanup interval, with slack
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(cache.len().await, 0);
        assert_eq!(cache.get("idle").await, None);
    }

    #[tokio::test]
    async fn test_expiry_is_sliding() {
        let cache = BoundedExpiringCache::new(&config(10, 300, 50));

        cache.put("busy", 1).await;
        for _ in 0..6 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            assert_eq!(cache.get("busy").await, Some(1));
        }
    }

    #[tokio::test]
    async fn test_shutdown_stops_janitor() {
        let cache = BoundedExpiringCache::new(&config(10, 50, 20));
        assert!(cache.janitor_running());

        cache.shutdown();
        cache.put("kept", 1).await;
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(!cache.janitor_running());
        assert!(cache.contains("kept").await);
    }

    #[tokio::test]
    async fn test_concurrent_access_respects_capacity() {
        let cache = Arc::new(BoundedExpiringCache::new(&config(16, 60_000, 60_000)));

        let mut handles = Vec::new();
        for worker in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..50 {
                    let key = format!("w{}-{}", worker, i % 10);
                    cache.put(key.clone(), i).await;
                    cache.get(&key).await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(cache.len().await, 16);
    }

    #[tokio::test]
    async fn test_fast_cache_contract() {
        let cache: BoundedExpiringCache<Vec<Turn>> =
            BoundedExpiringCache::new(&config(10, 60_000, 60_000));
        let fast: &dyn FastCache = &cache;

        fast.set("s", vec![Turn::user("q")], Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(fast.get("s").await.unwrap(), Some(vec![Turn::user("q")]));

        fast.delete("s").await.unwrap();
        assert_eq!(fast.get("s").await.unwrap(), None);
    }
}
