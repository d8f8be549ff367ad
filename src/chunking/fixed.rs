use crate::document::Document;

use super::tokenizer::TokenCounter;
use super::Chunker;

/// Token-bounded word windows with overlap.
#[derive(Debug, Clone)]
pub struct FixedChunker {
    max_tokens: usize,
    overlap: usize,
    tokenizer: TokenCounter,
}

impl Default for FixedChunker {
    fn default() -> Self {
        Self::new(512, 50)
    }
}

impl FixedChunker {
    pub fn new(max_tokens: usize, overlap: usize) -> Self {
        Self::with_tokenizer(max_tokens, overlap, TokenCounter::default())
    }

    pub fn with_tokenizer(max_tokens: usize, overlap: usize, tokenizer: TokenCounter) -> Self {
        Self {
            max_tokens: max_tokens.max(1),
            overlap,
            tokenizer,
        }
    }
}

impl Chunker for FixedChunker {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn chunk(&self, document: &Document) -> Vec<Document> {
        let words: Vec<&str> = document.content.split_whitespace().collect();
        let n = words.len();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < n {
            // Smallest end where the window reaches the token budget.
            let mut end = start + 1;
            while end < n && self.tokenizer.count(&words[start..end].join(" ")) < self.max_tokens {
                end += 1;
            }

            let content = words[start..end].join(" ");
            let token_count = self.tokenizer.count(&content);
            chunks.push(Document::new(
                content,
                document.chunk_metadata(self.name(), token_count),
            ));

            if end == n {
                break;
            }
            start = end.saturating_sub(self.overlap).max(start + 1);
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Metadata;
    use serde_json::json;

    fn doc(text: &str) -> Document {
        let mut metadata = Metadata::new();
        metadata.insert("source".into(), json!("test"));
        Document::new(text, metadata)
    }

    fn words_chunker(max_tokens: usize, overlap: usize) -> FixedChunker {
        FixedChunker::with_tokenizer(max_tokens, overlap, TokenCounter::words_only())
    }

    #[test]
    fn respects_overlap() {
        let chunks = words_chunker(4, 1).chunk(&doc("one two three four five six seven"));

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(texts, vec!["one two three four", "four five six seven"]);
    }

    #[test]
    fn no_overlap_partitions_words() {
        let chunks = words_chunker(2, 0).chunk(&doc("a b c d e"));

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(texts, vec!["a b", "c d", "e"]);
    }

    #[test]
    fn short_document_is_a_single_chunk() {
        let chunks = words_chunker(512, 50).chunk(&doc("just a few words"));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "just a few words");
    }

    #[test]
    fn overlap_larger_than_window_still_progresses() {
        let chunks = words_chunker(2, 10).chunk(&doc("a b c d"));

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(texts, vec!["a b", "b c", "c d"]);
    }

    #[test]
    fn chunks_carry_type_and_token_count() {
        let chunks = words_chunker(3, 0).chunk(&doc("alpha beta gamma delta"));

        assert_eq!(chunks[0].metadata["chunk_type"], json!("fixed"));
        assert_eq!(chunks[0].metadata["token_count"], json!(3));
        assert_eq!(chunks[1].metadata["token_count"], json!(1));
        assert_eq!(chunks[1].metadata["source"], json!("test"));
    }

    #[test]
    fn whitespace_only_document_yields_nothing() {
        assert!(words_chunker(4, 1).chunk(&doc(" \t\n ")).is_empty());
    }
}
