//! Session Module
//!
//! Chat turns, the durable-store and fast-cache contracts, and the
//! coordinator that keeps them coherent.

mod coordinator;
mod store;
mod turn;

pub use coordinator::SessionCacheCoordinator;
pub use store::{DurableStore, FastCache, InMemoryStore, InteractionId};
pub use turn::{Role, SessionId, Turn};
