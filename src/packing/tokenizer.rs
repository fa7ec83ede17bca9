//! Token counting used for budget enforcement.

/// Counts tokenizer units in a piece of text.
///
/// Only the length of the encoding matters to the packer.
pub trait TokenCounter: Send + Sync {
    fn count_tokens(&self, text: &str) -> usize;
}

/// Whitespace-delimited words. Used by default and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl TokenCounter for WhitespaceTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

#[cfg(feature = "hf-tokenizer")]
pub use hf::HfTokenizer;

#[cfg(feature = "hf-tokenizer")]
mod hf {
    use tokenizers::Tokenizer;

    use super::{TokenCounter, WhitespaceTokenizer};

    /// HuggingFace tokenizer, loaded from a local `tokenizer.json`.
    pub struct HfTokenizer {
        inner: Tokenizer,
    }

    impl HfTokenizer {
        pub fn new(inner: Tokenizer) -> Self {
            Self { inner }
        }

        pub fn from_file(path: &str) -> Result<Self, tokenizers::Error> {
            Tokenizer::from_file(path).map(Self::new)
        }
    }

    impl TokenCounter for HfTokenizer {
        fn count_tokens(&self, text: &str) -> usize {
            match self.inner.encode(text, false) {
                Ok(encoding) => encoding.len(),
                Err(err) => {
                    tracing::error!(error = %err, "Tokenizer failed, falling back to word count.");
                    WhitespaceTokenizer.count_tokens(text)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_tokenizer() {
        let tokenizer = WhitespaceTokenizer;
        assert_eq!(tokenizer.count_tokens(""), 0);
        assert_eq!(tokenizer.count_tokens("  one\ttwo \n three "), 3);
    }

    #[cfg(feature = "hf-tokenizer")]
    #[test]
    fn test_hf_tokenizer_from_file() {
        let path = concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/word_level_tokenizer.json"
        );
        let tokenizer = HfTokenizer::from_file(path).unwrap();

        assert_eq!(tokenizer.count_tokens("refund policy"), 2);
        // Out-of-vocabulary words still count as one unknown token each
        assert_eq!(tokenizer.count_tokens("refund within thirty days"), 4);
        assert_eq!(tokenizer.count_tokens(""), 0);
    }

    #[cfg(feature = "hf-tokenizer")]
    #[test]
    fn test_hf_tokenizer_missing_file() {
        assert!(HfTokenizer::from_file("/nonexistent/tokenizer.json").is_err());
    }
}
