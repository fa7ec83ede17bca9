//! Collaborator contracts for the session cache: the durable store and the
//! fast cache, plus an in-memory durable store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::session::{SessionId, Turn};

/// Identifier of one persisted write.
pub type InteractionId = Uuid;

/// Source of truth for session histories.
///
/// Implementations must give read-your-writes consistency to a caller that
/// writes and then reads the same session.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Appends `turns` to the session's history.
    async fn write(&self, session: &SessionId, turns: &[Turn]) -> Result<InteractionId>;

    /// Full ordered history, empty when the session is unknown.
    async fn read(&self, session: &SessionId) -> Result<Vec<Turn>>;
}

/// Fast, possibly stale replica of session histories.
///
/// Failures are reported as `ContextError::CacheUnavailable` and are never
/// fatal to the caller.
#[async_trait]
pub trait FastCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<Turn>>>;

    async fn set(&self, key: &str, value: Vec<Turn>, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;
}

// == In-Memory Store ==
/// Process-local durable store, used by the server binary and tests.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    sessions: RwLock<HashMap<SessionId, Vec<Turn>>>,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `read` calls served so far.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of `write` calls served so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DurableStore for InMemoryStore {
    async fn write(&self, session: &SessionId, turns: &[Turn]) -> Result<InteractionId> {
        self.sessions
            .write()
            .await
            .entry(session.clone())
            .or_default()
            .extend_from_slice(turns);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(Uuid::new_v4())
    }

    async fn read(&self, session: &SessionId) -> Result<Vec<Turn>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .sessions
            .read()
            .await
            .get(session)
            .cloned()
            .unwrap_or_default())
    }
}
