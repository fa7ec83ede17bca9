//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of the cache.
//!
//! # Tasks
//! - Janitor: removes idle cache entries at the configured interval

mod cleanup;

pub use cleanup::spawn_cleanup_task;
