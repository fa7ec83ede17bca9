//! Retrieved and ranked document types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One similarity-index result for a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Score in the index's native scale
    #[serde(rename = "score")]
    pub raw_score: f64,
}

impl RetrievedDocument {
    pub fn new(content: impl Into<String>, raw_score: f64) -> Self {
        Self {
            content: content.into(),
            metadata: BTreeMap::new(),
            raw_score,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Metadata rendered as `key: value` pairs joined by `, `.
    pub fn metadata_string(&self) -> String {
        self.metadata
            .iter()
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A document that survived the cutoff policy.
///
/// `document.raw_score` stays the externally reported relevance; the
/// normalized score is kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDocument {
    #[serde(flatten)]
    pub document: RetrievedDocument,
    pub normalized_score: f64,
}

impl RankedDocument {
    pub fn raw_score(&self) -> f64 {
        self.document.raw_score
    }
}

/// How the similarity index orders its scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreConvention {
    /// Higher is more relevant (inner product, cosine similarity)
    #[default]
    Similarity,
    /// Lower is more relevant (euclidean or other distances)
    Distance,
}

impl ScoreConvention {
    /// Maps a native score onto the higher-is-better scale used by the ranker.
    ///
    /// Distances go through `1 / (1 + d)`, which keeps order and stays positive
    /// for any non-negative distance.
    pub fn to_similarity(self, score: f64) -> f64 {
        match self {
            ScoreConvention::Similarity => score,
            ScoreConvention::Distance => 1.0 / (1.0 + score.max(0.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_string() {
        let doc = RetrievedDocument::new("body", 0.5)
            .with_metadata("source", "faq.csv")
            .with_metadata("page", "3");

        // BTreeMap keeps keys sorted
        assert_eq!(doc.metadata_string(), "page: 3, source: faq.csv");
        assert_eq!(RetrievedDocument::new("x", 1.0).metadata_string(), "");
    }

    #[test]
    fn test_distance_convention_preserves_order() {
        let near = ScoreConvention::Distance.to_similarity(0.1);
        let far = ScoreConvention::Distance.to_similarity(2.0);

        assert!(near > far);
        assert_eq!(ScoreConvention::Distance.to_similarity(0.0), 1.0);
        assert_eq!(ScoreConvention::Similarity.to_similarity(0.3), 0.3);
    }

    #[test]
    fn test_retrieved_document_wire_format() {
        let doc: RetrievedDocument =
            serde_json::from_str(r#"{"content": "c", "score": 0.7}"#).unwrap();
        assert_eq!(doc, RetrievedDocument::new("c", 0.7));
    }
}
