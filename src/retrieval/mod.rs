//! Retrieval Module
//!
//! Turns raw similarity-index results into the ranked subset worth packing.

mod document;
mod ranker;

pub use document::{RankedDocument, RetrievedDocument, ScoreConvention};
pub use ranker::RetrievalRanker;
