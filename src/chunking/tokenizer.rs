//! Token counting backed by tiktoken with a word-count fallback.

use std::sync::Arc;

use once_cell::sync::Lazy;
use tiktoken_rs::CoreBPE;
use tracing::warn;

static CL100K: Lazy<Option<Arc<CoreBPE>>> = Lazy::new(|| match tiktoken_rs::cl100k_base() {
    Ok(bpe) => Some(Arc::new(bpe)),
    Err(err) => {
        warn!("cl100k_base encoding unavailable, counting words instead: {}", err);
        None
    }
});

/// Counts tokens for a model's encoding.
#[derive(Clone)]
pub struct TokenCounter {
    bpe: Option<Arc<CoreBPE>>,
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCounter")
            .field("tiktoken", &self.bpe.is_some())
            .finish()
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new("gpt-4")
    }
}

impl TokenCounter {
    /// Encoder for `model`, falling back to `cl100k_base` for unknown models.
    pub fn new(model: &str) -> Self {
        let bpe = match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => Some(Arc::new(bpe)),
            Err(_) => CL100K.clone(),
        };
        Self { bpe }
    }

    /// Counter that always uses the whitespace word count.
    pub fn words_only() -> Self {
        Self { bpe: None }
    }

    /// Whether a tiktoken encoder backs this counter.
    pub fn has_encoder(&self) -> bool {
        self.bpe.is_some()
    }

    pub fn count(&self, text: &str) -> usize {
        match &self.bpe {
            Some(bpe) => bpe.encode_ordinary(text).len(),
            None => text.split_whitespace().count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_no_tokens() {
        assert_eq!(TokenCounter::default().count(""), 0);
        assert_eq!(TokenCounter::words_only().count("   "), 0);
    }

    #[test]
    fn words_only_counts_whitespace_separated_words() {
        let counter = TokenCounter::words_only();
        assert_eq!(counter.count("one two  three\nfour"), 4);
    }

    #[test]
    fn tiktoken_counts_grow_with_text() {
        let counter = TokenCounter::new("gpt-4o-mini");
        let short = counter.count("Energy policy");
        let long = counter.count("Energy policy governs how the grid is operated and priced.");
        assert!(short > 0);
        assert!(long > short);
    }

    #[test]
    fn unknown_model_falls_back_to_base_encoding() {
        let counter = TokenCounter::new("definitely-not-a-model");
        assert!(counter.count("hello world") > 0);
    }
}
