//! Expiry Janitor
//!
//! Background task that periodically removes idle cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns a background task that periodically sweeps expired cache entries.
///
/// The task sleeps for `cleanup_interval` between sweeps and takes the
/// cache's lock only for the sweep itself. It runs until the returned
/// handle is aborted.
///
/// # Example
/// ```ignore
/// let store = Arc::new(Mutex::new(CacheStore::<String>::new(1000, Duration::from_secs(300))));
/// let janitor = spawn_cleanup_task(store.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// janitor.abort();
/// ```
pub fn spawn_cleanup_task<V>(
    cache: Arc<Mutex<CacheStore<V>>>,
    cleanup_interval: Duration,
) -> JoinHandle<()>
where
    V: Clone + Send + 'static,
{
    tokio::spawn(async move {
        info!(
            "Starting cache janitor with interval of {}ms",
            cleanup_interval.as_millis()
        );

        loop {
            tokio::time::sleep(cleanup_interval).await;

            let (removed, remaining) = {
                let mut guard = cache.lock().await;
                let removed = guard.cleanup_expired();
                (removed, guard.len())
            };

            if removed > 0 {
                info!(
                    removed,
                    remaining, "Cache janitor: removed expired sessions"
                );
            } else {
                debug!(remaining, "Cache janitor: no expired sessions found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared(expiry: Duration) -> Arc<Mutex<CacheStore<String>>> {
        Arc::new(Mutex::new(CacheStore::new(100, expiry)))
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let cache = shared(Duration::from_millis(100));
        cache
            .lock()
            .await
            .put("expire_soon".to_string(), "value".to_string());

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(50));

        // Never read again; the janitor alone must remove it
        tokio::time::sleep(Duration::from_millis(400)).await;

        {
            let guard = cache.lock().await;
            assert!(!guard.contains("expire_soon"));
            assert_eq!(guard.stats().expirations, 1);
        }

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let cache = shared(Duration::from_secs(3600));
        cache
            .lock()
            .await
            .put("long_lived".to_string(), "value".to_string());

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(50));

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(
            cache.lock().await.get("long_lived"),
            Some("value".to_string())
        );

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let handle = spawn_cleanup_task(shared(Duration::from_secs(1)), Duration::from_secs(1));

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
