//! Packing Module
//!
//! Fits ranked documents and chat history into fixed token budgets.

mod packer;
mod tokenizer;

pub use packer::{ContextPacker, PackedContext, PackedHistory, NO_CONTEXT};
#[cfg(feature = "hf-tokenizer")]
pub use tokenizer::HfTokenizer;
pub use tokenizer::{TokenCounter, WhitespaceTokenizer};
