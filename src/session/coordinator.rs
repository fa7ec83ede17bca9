//! Cache-aside coordination of session history between a fast cache and
//! the durable store.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, warn};

use crate::config::SessionConfig;
use crate::error::{ContextError, Result};
use crate::session::{DurableStore, FastCache, InteractionId, SessionId, Turn};

/// Per-session async locks serializing store fallbacks and writes.
#[derive(Debug, Default)]
struct SessionLocks {
    locks: StdMutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    async fn acquire(&self, session: &SessionId) -> SessionLease<'_> {
        let lock = self.table().entry(session.clone()).or_default().clone();
        let mut lease = SessionLease {
            locks: self,
            session: session.clone(),
            guard: None,
        };
        lease.guard = Some(lock.lock_owned().await);
        lease
    }

    fn table(&self) -> MutexGuard<'_, HashMap<SessionId, Arc<Mutex<()>>>> {
        match self.locks.lock() {
            Ok(table) => table,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn len(&self) -> usize {
        self.table().len()
    }
}

/// Holds (or waits for) one session's lock.
///
/// Dropping it, including when the owning future is cancelled, releases the
/// lock and removes the table entry once nobody else holds or awaits it.
struct SessionLease<'a> {
    locks: &'a SessionLocks,
    session: SessionId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SessionLease<'_> {
    fn drop(&mut self) {
        let mut table = self.locks.table();
        drop(self.guard.take());
        // One reference in the table, none elsewhere
        if table
            .get(&self.session)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            table.remove(&self.session);
        }
    }
}

// == Session Cache Coordinator ==
/// Reads session history cache-first and writes it store-first.
///
/// - `get_history`: cache hit returns immediately; a miss reads the store
///   once per session even under concurrent misses, and repopulates the
///   cache when the store has history.
/// - `append_turn`: persists, then invalidates the cache entry. A failed or
///   timed-out write leaves the cache untouched.
///
/// Fast-cache failures and timeouts degrade to store-only reads. A session
/// whose invalidation failed bypasses the cache until a store read
/// overwrites the entry.
pub struct SessionCacheCoordinator {
    store: Arc<dyn DurableStore>,
    cache: Arc<dyn FastCache>,
    config: SessionConfig,
    locks: SessionLocks,
    stale: StdMutex<HashSet<SessionId>>,
}

impl SessionCacheCoordinator {
    pub fn new(
        store: Arc<dyn DurableStore>,
        cache: Arc<dyn FastCache>,
        config: SessionConfig,
    ) -> Self {
        Self {
            store,
            cache,
            config,
            locks: SessionLocks::default(),
            stale: StdMutex::new(HashSet::new()),
        }
    }

    /// History for `session` using the configured store deadline.
    pub async fn get_history(&self, session: &SessionId) -> Result<Vec<Turn>> {
        self.get_history_with_timeout(session, self.config.store_timeout)
            .await
    }

    /// History for `session`, failing with `StoreTimeout` if the store
    /// fallback takes longer than `store_timeout`.
    pub async fn get_history_with_timeout(
        &self,
        session: &SessionId,
        store_timeout: Duration,
    ) -> Result<Vec<Turn>> {
        if let Some(history) = self.cached(session).await {
            debug!(session = %session, "Session history cache hit");
            return Ok(history);
        }

        let _lease = self.locks.acquire(session).await;
        self.fill_from_store(session, store_timeout).await
    }

    async fn fill_from_store(
        &self,
        session: &SessionId,
        store_timeout: Duration,
    ) -> Result<Vec<Turn>> {
        // Another task may have filled the cache while we waited for the lock
        if let Some(history) = self.cached(session).await {
            debug!(session = %session, "Session history filled by concurrent reader");
            return Ok(history);
        }

        debug!(session = %session, "Session history cache miss, loading from store");
        let history = with_deadline(store_timeout, self.store.read(session))
            .await
            .inspect_err(|err| {
                error!(session = %session, error = %err, "Failed to load session history")
            })?;

        self.repopulate(session, &history).await;
        Ok(history)
    }

    /// Writes a fresh store read back to the cache. A stale session with no
    /// history gets its leftover entry deleted instead.
    async fn repopulate(&self, session: &SessionId, history: &[Turn]) {
        let stale = self.is_stale(session);
        let outcome = if !history.is_empty() {
            let set = self
                .cache
                .set(session.as_str(), history.to_vec(), self.config.cache_ttl);
            cache_call(self.config.cache_timeout, set).await
        } else if stale {
            cache_call(self.config.cache_timeout, self.cache.delete(session.as_str())).await
        } else {
            return;
        };

        match outcome {
            Ok(()) if stale => {
                self.stale_set().remove(session);
                debug!(session = %session, "Stale session cache entry replaced");
            }
            Ok(()) => {}
            Err(err) => {
                warn!(session = %session, error = %err, "Could not repopulate session cache")
            }
        }
    }

    /// Persists `turns` with the configured store deadline, then invalidates
    /// the cached history.
    pub async fn append_turn(&self, session: &SessionId, turns: &[Turn]) -> Result<InteractionId> {
        self.append_turn_with_timeout(session, turns, self.config.store_timeout)
            .await
    }

    pub async fn append_turn_with_timeout(
        &self,
        session: &SessionId,
        turns: &[Turn],
        store_timeout: Duration,
    ) -> Result<InteractionId> {
        if turns.is_empty() {
            return Err(ContextError::InvalidRequest(
                "no turns to append".to_string(),
            ));
        }

        let _lease = self.locks.acquire(session).await;
        self.persist_and_invalidate(session, turns, store_timeout).await
    }

    async fn persist_and_invalidate(
        &self,
        session: &SessionId,
        turns: &[Turn],
        store_timeout: Duration,
    ) -> Result<InteractionId> {
        let interaction = with_deadline(store_timeout, self.store.write(session, turns))
            .await
            .inspect_err(|err| {
                error!(session = %session, error = %err, "Failed to persist turns; cache left as is")
            })?;

        self.invalidate(session).await;
        debug!(
            session = %session,
            interaction = %interaction,
            turns = turns.len(),
            "Persisted turns and invalidated cached history"
        );
        Ok(interaction)
    }

    /// Drops the cached history for `session`. The durable record is kept.
    pub async fn forget(&self, session: &SessionId) {
        self.invalidate(session).await;
    }

    async fn invalidate(&self, session: &SessionId) {
        let delete = self.cache.delete(session.as_str());
        if let Err(err) = cache_call(self.config.cache_timeout, delete).await {
            self.stale_set().insert(session.clone());
            warn!(
                session = %session,
                error = %err,
                "Could not invalidate cached history; reading from store until refreshed"
            );
        }
    }

    fn stale_set(&self) -> MutexGuard<'_, HashSet<SessionId>> {
        match self.stale.lock() {
            Ok(stale) => stale,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn is_stale(&self, session: &SessionId) -> bool {
        self.stale_set().contains(session)
    }

    async fn cached(&self, session: &SessionId) -> Option<Vec<Turn>> {
        if self.is_stale(session) {
            debug!(session = %session, "Skipping stale session cache entry");
            return None;
        }
        match cache_call(self.config.cache_timeout, self.cache.get(session.as_str())).await {
            Ok(hit) => hit,
            Err(err) => {
                warn!(session = %session, error = %err, "Session cache unavailable, using store");
                None
            }
        }
    }

    /// Number of sessions with an in-flight fill or write.
    pub fn in_flight(&self) -> usize {
        self.locks.len()
    }
}

/// Runs a durable-store call under `deadline`.
async fn with_deadline<T>(
    deadline: Duration,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(ContextError::StoreTimeout(deadline)),
    }
}

/// Runs a fast-cache call under `deadline`; every failure is `CacheUnavailable`.
async fn cache_call<T>(deadline: Duration, call: impl Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(deadline, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(ContextError::CacheUnavailable(reason))) => {
            Err(ContextError::CacheUnavailable(reason))
        }
        Ok(Err(other)) => Err(ContextError::CacheUnavailable(other.to_string())),
        Err(_) => Err(ContextError::CacheUnavailable(format!(
            "no answer within {:?}",
            deadline
        ))),
    }
}
