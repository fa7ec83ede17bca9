//! API Handlers
//!
//! HTTP request handlers for each session context endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::BoundedExpiringCache;
use crate::config::Config;
use crate::error::{ContextError, Result};
use crate::models::{
    AppendTurnsRequest, AppendTurnsResponse, HealthResponse, HistoryResponse, InvalidateResponse,
    PrepareContextRequest, StatsResponse,
};
use crate::packing::{ContextPacker, TokenCounter, WhitespaceTokenizer};
use crate::pipeline::{ContextPipeline, PreparedContext};
use crate::retrieval::RetrievalRanker;
use crate::session::{DurableStore, InMemoryStore, SessionCacheCoordinator, SessionId, Turn};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ContextPipeline>,
    /// The in-process session cache, kept for stats and shutdown
    pub cache: Arc<BoundedExpiringCache<Vec<Turn>>>,
}

impl AppState {
    pub fn new(pipeline: ContextPipeline, cache: Arc<BoundedExpiringCache<Vec<Turn>>>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            cache,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Uses the in-memory durable store and whitespace token counting.
    /// Must be called inside a tokio runtime: the cache starts its janitor.
    pub fn from_config(config: &Config) -> Self {
        Self::with_backends(config, Arc::new(InMemoryStore::new()), Arc::new(WhitespaceTokenizer))
    }

    /// Creates a new AppState over a caller-supplied store and tokenizer.
    pub fn with_backends(
        config: &Config,
        store: Arc<dyn DurableStore>,
        tokenizer: Arc<dyn TokenCounter>,
    ) -> Self {
        let cache = Arc::new(BoundedExpiringCache::new(&config.cache));
        let sessions = SessionCacheCoordinator::new(store, cache.clone(), config.session);
        let pipeline = ContextPipeline::new(
            RetrievalRanker::new(config.ranker),
            ContextPacker::new(config.packer, tokenizer),
            Arc::new(sessions),
        );
        Self::new(pipeline, cache)
    }

    fn sessions(&self) -> &SessionCacheCoordinator {
        self.pipeline.sessions()
    }
}

fn session_id(raw: String) -> Result<SessionId> {
    if raw.trim().is_empty() {
        return Err(ContextError::InvalidRequest(
            "Session id cannot be empty".to_string(),
        ));
    }
    Ok(SessionId::from(raw))
}

/// Handler for POST /sessions/:session_id/context
///
/// Ranks the supplied retrieval results and packs them together with the
/// session history.
pub async fn prepare_context_handler(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(req): Json<PrepareContextRequest>,
) -> Result<Json<PreparedContext>> {
    let session = session_id(session)?;
    let prepared = state
        .pipeline
        .prepare(&session, req.documents, req.convention)
        .await?;

    Ok(Json(prepared))
}

/// Handler for POST /sessions/:session_id/turns
pub async fn append_turns_handler(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(req): Json<AppendTurnsRequest>,
) -> Result<Json<AppendTurnsResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ContextError::InvalidRequest(error_msg));
    }
    let session = session_id(session)?;

    let interaction = state.sessions().append_turn(&session, &req.turns).await?;

    Ok(Json(AppendTurnsResponse::new(
        session,
        interaction,
        req.turns.len(),
    )))
}

/// Handler for GET /sessions/:session_id/history
pub async fn history_handler(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> Result<Json<HistoryResponse>> {
    let session = session_id(session)?;
    let turns = state.sessions().get_history(&session).await?;

    Ok(Json(HistoryResponse {
        session_id: session,
        turns,
    }))
}

/// Handler for DELETE /sessions/:session_id/cache
///
/// Drops the cached history only; the durable record is untouched.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> Result<Json<InvalidateResponse>> {
    let session = session_id(session)?;
    state.sessions().forget(&session).await;

    Ok(Json(InvalidateResponse::new(session)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats().await))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::{RetrievedDocument, ScoreConvention};

    fn state() -> AppState {
        AppState::from_config(&Config::default())
    }

    #[tokio::test]
    async fn test_append_then_history() {
        let state = state();

        let req = AppendTurnsRequest {
            turns: vec![Turn::user("hello"), Turn::assistant("hi there")],
        };
        let response = append_turns_handler(State(state.clone()), Path("s1".to_string()), Json(req))
            .await
            .unwrap();
        assert_eq!(response.turns_appended, 2);

        let history = history_handler(State(state), Path("s1".to_string()))
            .await
            .unwrap();
        assert_eq!(history.turns.len(), 2);
        assert_eq!(history.turns[1].content, "hi there");
    }

    #[tokio::test]
    async fn test_append_rejects_empty_turns() {
        let req = AppendTurnsRequest { turns: vec![] };
        let result = append_turns_handler(State(state()), Path("s1".to_string()), Json(req)).await;

        assert!(matches!(result, Err(ContextError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_blank_session_id_rejected() {
        let result = history_handler(State(state()), Path("  ".to_string())).await;
        assert!(matches!(result, Err(ContextError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_prepare_context_handler() {
        let req = PrepareContextRequest {
            documents: vec![
                RetrievedDocument::new("alpha", 0.9),
                RetrievedDocument::new("beta", 0.1),
            ],
            convention: ScoreConvention::Similarity,
        };

        let prepared = prepare_context_handler(State(state()), Path("s1".to_string()), Json(req))
            .await
            .unwrap();
        assert_eq!(prepared.documents.len(), 1);
        assert_eq!(prepared.context.documents_included, 1);
    }

    #[tokio::test]
    async fn test_invalidate_keeps_durable_history() {
        let state = state();
        let req = AppendTurnsRequest {
            turns: vec![Turn::user("remember me")],
        };
        append_turns_handler(State(state.clone()), Path("s1".to_string()), Json(req))
            .await
            .unwrap();
        history_handler(State(state.clone()), Path("s1".to_string()))
            .await
            .unwrap();
        assert!(state.cache.contains("s1").await);

        invalidate_handler(State(state.clone()), Path("s1".to_string()))
            .await
            .unwrap();
        assert!(!state.cache.contains("s1").await);

        let history = history_handler(State(state), Path("s1".to_string()))
            .await
            .unwrap();
        assert_eq!(history.turns, vec![Turn::user("remember me")]);
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let response = stats_handler(State(state())).await;
        assert_eq!(response.hits, 0);
        assert_eq!(response.misses, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
