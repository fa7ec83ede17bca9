//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with sliding expiry.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A cached value with the timestamps the janitor needs.
///
/// Expiry is sliding: `last_accessed` is refreshed on every hit and every
/// overwrite, and an entry expires once it has been idle for longer than
/// its `ttl`.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// When the key was first inserted (kept across overwrites)
    pub inserted_at: Instant,
    /// Last `get` hit or `put`
    pub last_accessed: Instant,
    /// Idle time allowed before expiry
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry stamped at `now`.
    pub fn new(value: V, ttl: Duration, now: Instant) -> Self {
        Self {
            value,
            inserted_at: now,
            last_accessed: now,
            ttl,
        }
    }

    // == Touch ==
    /// Refreshes the access timestamp.
    pub fn touch(&mut self, now: Instant) {
        self.last_accessed = now;
    }

    // == Is Expired ==
    /// Checks whether the entry has been idle for strictly longer than its TTL.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.idle_for(now) > self.ttl
    }

    /// Time since the last access, saturating at zero.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_accessed)
    }
}
