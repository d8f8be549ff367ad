use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::Document;

use super::semantic::SemanticChunker;
use super::tokenizer::TokenCounter;
use super::Chunker;

static MARKDOWN_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n#{1,6}\s+").expect("valid header regex"));

/// Splits on Markdown headers; oversized sections go through [`SemanticChunker`].
#[derive(Debug, Clone)]
pub struct StructuralChunker {
    max_tokens: usize,
    tokenizer: TokenCounter,
}

impl Default for StructuralChunker {
    fn default() -> Self {
        Self::new(512)
    }
}

impl StructuralChunker {
    pub fn new(max_tokens: usize) -> Self {
        Self::with_tokenizer(max_tokens, TokenCounter::default())
    }

    pub fn with_tokenizer(max_tokens: usize, tokenizer: TokenCounter) -> Self {
        Self {
            max_tokens,
            tokenizer,
        }
    }
}

impl Chunker for StructuralChunker {
    fn name(&self) -> &'static str {
        "structural"
    }

    fn chunk(&self, document: &Document) -> Vec<Document> {
        let mut chunks = Vec::new();

        for section in MARKDOWN_HEADER
            .split(&document.content)
            .filter(|s| !s.trim().is_empty())
        {
            let token_count = self.tokenizer.count(section);
            if token_count <= self.max_tokens {
                chunks.push(Document::new(
                    section.trim(),
                    document.chunk_metadata(self.name(), token_count),
                ));
            } else {
                let fallback =
                    SemanticChunker::with_tokenizer(self.max_tokens, self.tokenizer.clone());
                chunks.extend(fallback.chunk(&Document::new(section, document.metadata.clone())));
            }
        }

        chunks
    }
}
