use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::Document;

use super::tokenizer::TokenCounter;
use super::Chunker;

static SENTENCE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("valid sentence regex"));

/// Split text after `.`, `!` or `?` when followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let text = text.trim();
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in SENTENCE_BREAK.find_iter(text) {
        // punctuation is a single byte, keep it with the sentence
        let sentence = text[start..m.start() + 1].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = m.end();
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Sentence-accumulating chunker bounded by a token budget.
#[derive(Debug, Clone)]
pub struct SemanticChunker {
    max_tokens: usize,
    tokenizer: TokenCounter,
}

impl Default for SemanticChunker {
    fn default() -> Self {
        Self::new(512)
    }
}

impl SemanticChunker {
    pub fn new(max_tokens: usize) -> Self {
        Self::with_tokenizer(max_tokens, TokenCounter::default())
    }

    pub fn with_tokenizer(max_tokens: usize, tokenizer: TokenCounter) -> Self {
        Self {
            max_tokens,
            tokenizer,
        }
    }

    fn emit(&self, document: &Document, buffer: &[&str]) -> Document {
        let content = buffer.join(" ");
        let token_count = self.tokenizer.count(&content);
        Document::new(content, document.chunk_metadata(self.name(), token_count))
    }
}

impl Chunker for SemanticChunker {
    fn name(&self) -> &'static str {
        "semantic"
    }

    fn chunk(&self, document: &Document) -> Vec<Document> {
        let mut chunks = Vec::new();
        let mut buffer: Vec<&str> = Vec::new();

        for sentence in split_sentences(&document.content) {
            let mut candidate = buffer.join(" ");
            if !candidate.is_empty() {
                candidate.push(' ');
            }
            candidate.push_str(sentence);

            if self.tokenizer.count(&candidate) > self.max_tokens && !buffer.is_empty() {
                chunks.push(self.emit(document, &buffer));
                buffer.clear();
            }
            buffer.push(sentence);
        }

        if !buffer.is_empty() {
            chunks.push(self.emit(document, &buffer));
        }

        chunks
    }
}
