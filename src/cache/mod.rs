//! Cache Module
//!
//! Provides the in-process session cache: LRU eviction on capacity overflow
//! and sliding idle expiry enforced by a background janitor.

mod bounded;
mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use bounded::BoundedExpiringCache;
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::CacheStore;
