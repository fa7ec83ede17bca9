//! Response DTOs for the session context API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::session::{InteractionId, SessionId, Turn};

/// Response body for `POST /sessions/:session_id/turns`
#[derive(Debug, Clone, Serialize)]
pub struct AppendTurnsResponse {
    pub session_id: SessionId,
    pub interaction_id: InteractionId,
    pub turns_appended: usize,
    /// ISO 8601 time the write was acknowledged
    pub recorded_at: String,
}

impl AppendTurnsResponse {
    pub fn new(session_id: SessionId, interaction_id: InteractionId, turns_appended: usize) -> Self {
        Self {
            session_id,
            interaction_id,
            turns_appended,
            recorded_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for `GET /sessions/:session_id/history`
#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub session_id: SessionId,
    pub turns: Vec<Turn>,
}

/// Response body for `DELETE /sessions/:session_id/cache`
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub message: String,
    pub session_id: SessionId,
}

impl InvalidateResponse {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            message: format!("Cached history for '{}' invalidated", session_id),
            session_id,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            total_entries: stats.total_entries,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
