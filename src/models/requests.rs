//! Request DTOs for the session context API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::retrieval::{RetrievedDocument, ScoreConvention};
use crate::session::Turn;

/// Request body for `POST /sessions/:session_id/context`
///
/// # Fields
/// - `documents`: similarity-index results, in index order
/// - `convention`: how the index scores (`similarity` by default)
#[derive(Debug, Clone, Deserialize)]
pub struct PrepareContextRequest {
    #[serde(default)]
    pub documents: Vec<RetrievedDocument>,
    #[serde(default)]
    pub convention: ScoreConvention,
}

/// Request body for `POST /sessions/:session_id/turns`
#[derive(Debug, Clone, Deserialize)]
pub struct AppendTurnsRequest {
    pub turns: Vec<Turn>,
}

impl AppendTurnsRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.turns.is_empty() {
            return Some("At least one turn is required".to_string());
        }
        if let Some(position) = self.turns.iter().position(|t| t.content.trim().is_empty()) {
            return Some(format!("Turn {} has empty content", position));
        }
        None
    }
}
