//! Request-level orchestration: rank retrieved documents, pack them and the
//! session history into their budgets, and write the finished exchange back.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::packing::{ContextPacker, PackedContext, PackedHistory};
use crate::retrieval::{RankedDocument, RetrievalRanker, RetrievedDocument, ScoreConvention};
use crate::session::{InteractionId, SessionCacheCoordinator, SessionId, Turn};

/// Wall-clock time spent in each stage of [`ContextPipeline::prepare`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StageTimings {
    #[serde(with = "millis")]
    pub retrieval: Duration,
    #[serde(with = "millis")]
    pub combine_docs: Duration,
    #[serde(with = "millis")]
    pub process_history: Duration,
}

/// Everything the generation call needs for one request.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedContext {
    pub session_id: SessionId,
    /// Documents that survived ranking, reported with their raw scores
    pub documents: Vec<RankedDocument>,
    pub context: PackedContext,
    pub history: PackedHistory,
    pub timings: StageTimings,
}

// == Context Pipeline ==
/// Runs ranker → document packer → history fetch → history packer.
#[derive(Clone)]
pub struct ContextPipeline {
    ranker: RetrievalRanker,
    packer: ContextPacker,
    sessions: Arc<SessionCacheCoordinator>,
}

impl ContextPipeline {
    pub fn new(
        ranker: RetrievalRanker,
        packer: ContextPacker,
        sessions: Arc<SessionCacheCoordinator>,
    ) -> Self {
        Self {
            ranker,
            packer,
            sessions,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionCacheCoordinator> {
        &self.sessions
    }

    /// Builds the bounded context and history window for one query.
    ///
    /// A degenerate score distribution is not an error: the context falls
    /// back to the "no context" text. Store failures are propagated.
    pub async fn prepare(
        &self,
        session: &SessionId,
        results: Vec<RetrievedDocument>,
        convention: ScoreConvention,
    ) -> Result<PreparedContext> {
        let started = Instant::now();
        let documents = self.ranker.rank_or_empty(results, convention);
        let retrieval = started.elapsed();

        let started = Instant::now();
        let context = self.packer.pack_documents(&documents);
        let combine_docs = started.elapsed();

        let full_history = self.sessions.get_history(session).await?;

        let started = Instant::now();
        let history = self.packer.pack_history(&full_history);
        let process_history = started.elapsed();

        let timings = StageTimings {
            retrieval,
            combine_docs,
            process_history,
        };

        info!(
            session = %session,
            retrieved_docs = documents.len(),
            context_tokens = context.token_count,
            context_limit_exceeded = context.limit_exceeded,
            history_turns = history.turns.len(),
            history_tokens = history.token_count,
            history_limit_exceeded = history.limit_exceeded,
            "Prepared request context"
        );
        debug!(session = %session, ?timings, "Context stage timings");

        Ok(PreparedContext {
            session_id: session.clone(),
            documents,
            context,
            history,
            timings,
        })
    }

    /// Records the user query and the generated answer for the session.
    pub async fn commit_exchange(
        &self,
        session: &SessionId,
        query: impl Into<String>,
        answer: impl Into<String>,
    ) -> Result<InteractionId> {
        let turns = [Turn::user(query), Turn::assistant(answer)];
        self.sessions.append_turn(session, &turns).await
    }
}

mod millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64() * 1000.0)
    }
}
