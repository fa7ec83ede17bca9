//! Cache Store Module
//!
//! Single-threaded cache engine combining HashMap storage with LRU tracking
//! and sliding expiry. Thread safety is layered on top by
//! [`BoundedExpiringCache`](super::BoundedExpiringCache).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::cache::{CacheEntry, CacheStats, LruTracker};

// == Cache Store ==
/// Capacity-bounded map with LRU eviction and janitor-driven expiry.
///
/// Expiry is never checked on `get`: an idle entry stays readable until
/// [`cleanup_expired`](Self::cleanup_expired) sweeps it.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: usize,
    /// Upper bound on per-entry idle TTL
    expiry_time: Duration,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and idle expiry.
    pub fn new(capacity: usize, expiry_time: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            capacity,
            expiry_time,
        }
    }

    // == Get ==
    /// Retrieves a value by key, marking it most recently used and
    /// refreshing its access timestamp.
    pub fn get(&mut self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub(crate) fn get_at(&mut self, key: &str, now: Instant) -> Option<V> {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.touch(now);
                let value = entry.value.clone();
                self.lru.touch(key);
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Put ==
    /// Inserts or overwrites a value using the store's expiry time.
    ///
    /// Returns the key evicted to make room, if any.
    pub fn put(&mut self, key: String, value: V) -> Option<String> {
        self.put_at(key, value, None, Instant::now())
    }

    /// Inserts or overwrites a value with its own idle TTL.
    ///
    /// TTLs longer than the store's expiry time are clamped to it.
    pub fn put_with_ttl(&mut self, key: String, value: V, ttl: Duration) -> Option<String> {
        self.put_at(key, value, Some(ttl), Instant::now())
    }

    pub(crate) fn put_at(
        &mut self,
        key: String,
        value: V,
        ttl: Option<Duration>,
        now: Instant,
    ) -> Option<String> {
        let ttl = ttl.map_or(self.expiry_time, |ttl| ttl.min(self.expiry_time));

        match self.entries.get_mut(&key) {
            Some(entry) => {
                entry.value = value;
                entry.ttl = ttl;
                entry.touch(now);
            }
            None => {
                self.entries
                    .insert(key.clone(), CacheEntry::new(value, ttl, now));
            }
        }
        self.lru.touch(&key);

        // Evict after inserting so the newcomer is never the victim unless capacity is zero
        let evicted = if self.entries.len() > self.capacity {
            self.lru.evict_oldest().map(|victim| {
                self.entries.remove(&victim);
                self.stats.record_eviction();
                victim
            })
        } else {
            None
        };

        self.stats.set_total_entries(self.entries.len());
        evicted
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether it was present.
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.lru.remove(key);
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }

    // == Cleanup Expired ==
    /// Removes every entry idle for longer than its TTL.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        self.cleanup_expired_at(Instant::now())
    }

    pub(crate) fn cleanup_expired_at(&mut self, now: Instant) -> usize {
        let expired: Vec<String> = self
            .lru
            .keys_oldest_first()
            .filter(|key| {
                self.entries
                    .get(*key)
                    .is_some_and(|entry| entry.is_expired(now))
            })
            .map(str::to_string)
            .collect();

        for key in &expired {
            self.entries.remove(key);
            self.lru.remove(key);
        }

        self.stats.record_expirations(expired.len());
        self.stats.set_total_entries(self.entries.len());
        expired.len()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Checks residency without touching LRU order or stats.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Resident keys from least to most recently used.
    pub fn keys_oldest_first(&self) -> Vec<String> {
        self.lru.keys_oldest_first().map(str::to_string).collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
