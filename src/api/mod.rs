//! API Module
//!
//! HTTP handlers and routing for the session context REST API.
//!
//! # Endpoints
//! - `POST /sessions/:session_id/context` - Prepare the bounded context for a query
//! - `POST /sessions/:session_id/turns` - Append turns to a session
//! - `GET /sessions/:session_id/history` - Read a session's history
//! - `DELETE /sessions/:session_id/cache` - Invalidate cached history
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
