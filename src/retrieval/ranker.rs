//! Score normalization and cumulative cutoff over similarity-index results.

use std::cmp::Ordering;

use tracing::{debug, warn};

use crate::config::RankerConfig;
use crate::error::{ContextError, Result};
use crate::retrieval::{RankedDocument, RetrievedDocument, ScoreConvention};

/// Slack on the cumulative comparison so that sums like 0.3 + 0.5 still
/// count as `<= 0.8`.
const CDF_EPSILON: f64 = 1e-9;

// == Retrieval Ranker ==
/// Keeps the head of a result list whose normalized scores add up to at
/// most `cutoff_distance`, then drops anything under the absolute floor.
#[derive(Debug, Clone)]
pub struct RetrievalRanker {
    config: RankerConfig,
}

impl RetrievalRanker {
    pub fn new(config: RankerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    /// Ranks one query's results.
    ///
    /// Only the first `max_documents_to_retrieve` results are considered.
    /// Fails with `InvalidScoreDistribution` when there is nothing to
    /// normalize: no candidates, a non-finite score, or a non-positive sum.
    pub fn rank(
        &self,
        documents: Vec<RetrievedDocument>,
        convention: ScoreConvention,
    ) -> Result<Vec<RankedDocument>> {
        let mut documents = documents;
        documents.truncate(self.config.max_documents_to_retrieve);

        if documents.is_empty() {
            return Err(ContextError::InvalidScoreDistribution(
                "no candidates to rank".to_string(),
            ));
        }

        let relevance: Vec<f64> = documents
            .iter()
            .map(|doc| convention.to_similarity(doc.raw_score))
            .collect();

        if relevance.iter().any(|score| !score.is_finite()) {
            return Err(ContextError::InvalidScoreDistribution(
                "non-finite score".to_string(),
            ));
        }

        let total: f64 = relevance.iter().sum();
        if total <= 0.0 {
            return Err(ContextError::InvalidScoreDistribution(format!(
                "score sum {} is not positive",
                total
            )));
        }

        let normalized: Vec<f64> = relevance.iter().map(|score| score / total).collect();

        // Stable: equal scores keep the index's order
        let mut order: Vec<usize> = (0..documents.len()).collect();
        order.sort_by(|&a, &b| {
            normalized[b]
                .partial_cmp(&normalized[a])
                .unwrap_or(Ordering::Equal)
        });

        let keep = cutoff_len(order.iter().map(|&i| normalized[i]), self.config.cutoff_distance);

        let mut slots: Vec<Option<RetrievedDocument>> = documents.into_iter().map(Some).collect();
        let ranked: Vec<RankedDocument> = order
            .into_iter()
            .take(keep)
            .filter(|&i| relevance[i] >= self.config.min_score_distance)
            .filter_map(|i| {
                slots[i].take().map(|document| RankedDocument {
                    document,
                    normalized_score: normalized[i],
                })
            })
            .collect();

        debug!(
            candidates = relevance.len(),
            cutoff_keep = keep,
            retained = ranked.len(),
            "Ranked retrieval results"
        );
        Ok(ranked)
    }

    /// Like [`rank`](Self::rank), but a degenerate distribution yields no
    /// documents instead of an error.
    pub fn rank_or_empty(
        &self,
        documents: Vec<RetrievedDocument>,
        convention: ScoreConvention,
    ) -> Vec<RankedDocument> {
        match self.rank(documents, convention) {
            Ok(ranked) => ranked,
            Err(err) => {
                warn!(error = %err, "Discarding retrieval results");
                Vec::new()
            }
        }
    }
}

/// Number of leading scores to keep: up to the last position whose running
/// sum is within `cutoff`, and never fewer than one.
fn cutoff_len(sorted_scores: impl Iterator<Item = f64>, cutoff: f64) -> usize {
    let mut cumulative = 0.0;
    let mut keep = 0;
    for (position, score) in sorted_scores.enumerate() {
        cumulative += score;
        if cumulative <= cutoff + CDF_EPSILON {
            keep = position + 1;
        }
    }
    keep.max(1)
}
