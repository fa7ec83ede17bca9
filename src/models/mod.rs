//! Request and Response models for the session context API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{AppendTurnsRequest, PrepareContextRequest};
pub use responses::{
    AppendTurnsResponse, ErrorResponse, HealthResponse, HistoryResponse, InvalidateResponse,
    StatsResponse,
};
