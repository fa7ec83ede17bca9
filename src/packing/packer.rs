//! Greedy token-budget packing of ranked documents and chat history.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::config::PackerConfig;
use crate::packing::TokenCounter;
use crate::retrieval::RankedDocument;
use crate::session::Turn;

/// Context text used when no document fits the budget.
pub const NO_CONTEXT: &str = "No context provided";

/// Documents concatenated into one prompt block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackedContext {
    pub text: String,
    pub token_count: usize,
    pub limit_exceeded: bool,
    pub documents_included: usize,
    /// Length of `text` in bytes
    pub combined_text_size: usize,
}

/// The most recent turns that fit the history budget, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackedHistory {
    pub turns: Vec<Turn>,
    pub token_count: usize,
    pub limit_exceeded: bool,
}

// == Context Packer ==
/// Fills the context and history token budgets greedily, in rank order
/// for documents and newest-first for turns. Packing stops at the first
/// item that does not fit; later items are never considered.
#[derive(Clone)]
pub struct ContextPacker {
    config: PackerConfig,
    tokenizer: Arc<dyn TokenCounter>,
}

impl ContextPacker {
    pub fn new(config: PackerConfig, tokenizer: Arc<dyn TokenCounter>) -> Self {
        Self { config, tokenizer }
    }

    pub fn config(&self) -> &PackerConfig {
        &self.config
    }

    /// Concatenates documents until the next one would exceed
    /// `max_context_tokens`.
    ///
    /// A document costs the tokens of its metadata string plus its content.
    pub fn pack_documents(&self, documents: &[RankedDocument]) -> PackedContext {
        let budget = self.config.max_context_tokens;
        let mut text = String::new();
        let mut token_count = 0;
        let mut documents_included = 0;
        let mut limit_exceeded = false;

        for ranked in documents {
            let doc = &ranked.document;
            let metadata = doc.metadata_string();
            let cost = self.tokenizer.count_tokens(&metadata)
                + self.tokenizer.count_tokens(&doc.content);

            if token_count + cost > budget {
                limit_exceeded = true;
                break;
            }

            let _ = write!(
                text,
                "\n\n[Metadata: {}]\n[Content: {}]\n[Score: {}]",
                metadata, doc.content, doc.raw_score
            );
            token_count += cost;
            documents_included += 1;
        }

        if limit_exceeded {
            warn!(
                budget,
                documents_included,
                documents_offered = documents.len(),
                "Combined context exceeded token budget"
            );
        }

        if documents_included == 0 {
            return PackedContext {
                text: NO_CONTEXT.to_string(),
                token_count: 0,
                limit_exceeded,
                documents_included,
                combined_text_size: NO_CONTEXT.len(),
            };
        }

        PackedContext {
            combined_text_size: text.len(),
            text,
            token_count,
            limit_exceeded,
            documents_included,
        }
    }

    /// Keeps the longest suffix of `history` whose content fits
    /// `max_history_tokens`.
    pub fn pack_history(&self, history: &[Turn]) -> PackedHistory {
        let budget = self.config.max_history_tokens;
        let mut token_count = 0;
        let mut kept = 0;
        let mut limit_exceeded = false;

        for turn in history.iter().rev() {
            let cost = self.tokenizer.count_tokens(&turn.content);
            if token_count + cost > budget {
                limit_exceeded = true;
                break;
            }
            token_count += cost;
            kept += 1;
        }

        if limit_exceeded {
            warn!(
                budget,
                kept,
                dropped = history.len() - kept,
                "Chat history truncated to token budget"
            );
        }

        PackedHistory {
            turns: history[history.len() - kept..].to_vec(),
            token_count,
            limit_exceeded,
        }
    }
}
