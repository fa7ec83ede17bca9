//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for cache eviction.

use std::collections::{HashMap, VecDeque};

/// Stale queue slots tolerated before the queue is compacted.
const COMPACT_SLACK: usize = 32;

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Every touch appends a `(stamp, key)` slot to the back of a queue and
/// records the stamp as the key's current one. Slots whose stamp no longer
/// matches are stale and are skipped when popping from the front, so touch,
/// remove and eviction are all O(1) amortized.
/// - Front = Least recently used
/// - Back = Most recently used
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Access slots, oldest first (may contain stale slots)
    order: VecDeque<(u64, String)>,
    /// Current stamp of every tracked key
    stamps: HashMap<String, u64>,
    /// Next stamp to hand out
    next_stamp: u64,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used (moves it to the back).
    pub fn touch(&mut self, key: &str) {
        let stamp = self.next_stamp;
        self.next_stamp += 1;

        self.stamps.insert(key.to_string(), stamp);
        self.order.push_back((stamp, key.to_string()));
        self.maybe_compact();
    }

    // == Remove ==
    /// Stops tracking a key. Its queue slots become stale.
    pub fn remove(&mut self, key: &str) {
        self.stamps.remove(key);
        self.maybe_compact();
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<String> {
        self.skip_stale();
        let (_, key) = self.order.pop_front()?;
        self.stamps.remove(&key);
        Some(key)
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    #[cfg(test)]
    pub fn peek_oldest(&mut self) -> Option<&str> {
        self.skip_stale();
        self.order.front().map(|(_, key)| key.as_str())
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    // == Contains ==
    /// Checks if a key is being tracked.
    pub fn contains(&self, key: &str) -> bool {
        self.stamps.contains_key(key)
    }

    /// Tracked keys from least to most recently used.
    pub fn keys_oldest_first(&self) -> impl Iterator<Item = &str> {
        self.order
            .iter()
            .filter(|(stamp, key)| self.is_live(*stamp, key))
            .map(|(_, key)| key.as_str())
    }

    fn is_live(&self, stamp: u64, key: &str) -> bool {
        self.stamps.get(key) == Some(&stamp)
    }

    fn skip_stale(&mut self) {
        while let Some((stamp, key)) = self.order.front() {
            if self.is_live(*stamp, key) {
                break;
            }
            self.order.pop_front();
        }
    }

    fn maybe_compact(&mut self) {
        if self.order.len() <= 2 * self.stamps.len() + COMPACT_SLACK {
            return;
        }
        let stamps = &self.stamps;
        self.order
            .retain(|(stamp, key)| stamps.get(key) == Some(stamp));
    }
}
