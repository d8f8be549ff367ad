//! Document chunking.
//!
//! Three strategies share the [`Chunker`] capability:
//! - [`FixedChunker`]: token-bounded word windows with overlap
//! - [`SemanticChunker`]: sentence accumulation under a token budget
//! - [`StructuralChunker`]: Markdown sections, semantic fallback for large ones
//!
//! Every chunk inherits its parent's metadata plus `chunk_type` and
//! `token_count`.

pub mod fixed;
pub mod semantic;
pub mod structural;
pub mod tokenizer;

use std::path::Path;

use tracing::{info, warn};

use crate::config::ChunkingConfig;
use crate::document::{read_jsonl, write_jsonl, Document};
use crate::error::{Error, Result};

pub use fixed::FixedChunker;
pub use semantic::{split_sentences, SemanticChunker};
pub use structural::StructuralChunker;
pub use tokenizer::TokenCounter;

/// Splits a document into bounded-size sub-documents.
pub trait Chunker: Send + Sync {
    fn name(&self) -> &'static str;
    fn chunk(&self, document: &Document) -> Vec<Document>;
}

/// Build a chunker by strategy name (`fixed`, `semantic`, `structural`).
pub fn chunker_for(name: &str, config: &ChunkingConfig) -> Result<Box<dyn Chunker>> {
    let tokenizer = TokenCounter::default();
    match name.to_lowercase().as_str() {
        "fixed" => Ok(Box::new(FixedChunker::with_tokenizer(
            config.max_tokens,
            config.overlap,
            tokenizer,
        ))),
        "semantic" => Ok(Box::new(SemanticChunker::with_tokenizer(
            config.max_tokens,
            tokenizer,
        ))),
        "structural" => Ok(Box::new(StructuralChunker::with_tokenizer(
            config.max_tokens,
            tokenizer,
        ))),
        other => Err(Error::InvalidArgument(format!(
            "Unknown chunking strategy: {}",
            other
        ))),
    }
}

/// Chunk every document in `input` with each chunker and write `output`.
///
/// Returns the number of chunks written. A missing input file is logged and
/// produces no output.
pub fn run_chunking(input: &Path, output: &Path, chunkers: &[Box<dyn Chunker>]) -> Result<usize> {
    if !input.exists() {
        warn!(path = %input.display(), "No input documents found");
        return Ok(0);
    }

    let documents = read_jsonl(input)?;
    let mut chunks = Vec::new();
    for doc in &documents {
        for chunker in chunkers {
            chunks.extend(chunker.chunk(doc));
        }
    }

    write_jsonl(output, &chunks)?;
    info!(
        documents = documents.len(),
        chunks = chunks.len(),
        "Chunking completed"
    );
    Ok(chunks.len())
}
