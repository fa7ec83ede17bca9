//! Session Context - retrieval-augmented prompt context preparation
//!
//! Ranks similarity-search results, packs documents and chat history into
//! token budgets, and keeps per-session history in a bounded, expiring
//! cache in front of a durable store.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod packing;
pub mod pipeline;
pub mod retrieval;
pub mod session;
pub mod tasks;

pub use api::AppState;
pub use cache::BoundedExpiringCache;
pub use config::Config;
pub use error::{ContextError, Result};
pub use packing::{ContextPacker, TokenCounter};
pub use pipeline::{ContextPipeline, PreparedContext};
pub use retrieval::{RetrievalRanker, RetrievedDocument, ScoreConvention};
pub use session::{DurableStore, FastCache, SessionCacheCoordinator, SessionId, Turn};
pub use tasks::spawn_cleanup_task;
