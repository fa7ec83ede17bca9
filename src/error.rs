//! Error types for the session context core
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Context Error Enum ==
/// Unified error type for ranking, packing and session caching.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContextError {
    /// Ranker input cannot be normalized (empty, non-finite or non-positive sum)
    #[error("Invalid score distribution: {0}")]
    InvalidScoreDistribution(String),

    /// Durable store read or write failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Durable store did not answer within the deadline
    #[error("Store timed out after {0:?}")]
    StoreTimeout(Duration),

    /// Fast cache backend unreachable; callers degrade to store-only mode
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ContextError {
    fn into_response(self) -> Response {
        let status = match &self {
            ContextError::InvalidRequest(_) | ContextError::InvalidScoreDistribution(_) => {
                StatusCode::BAD_REQUEST
            }
            ContextError::StoreTimeout(_) | ContextError::CacheUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ContextError::Persistence(_) | ContextError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the session context core.
pub type Result<T> = std::result::Result<T, ContextError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ContextError::InvalidRequest("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ContextError::StoreTimeout(Duration::from_millis(5)),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ContextError::Persistence("disk".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_display_includes_detail() {
        let err = ContextError::Persistence("connection reset".to_string());
        assert_eq!(err.to_string(), "Persistence error: connection reset");
    }
}
