//! Offline pipeline stages: ingest, chunk and index.

use anyhow::{Context, Result};
use tracing::info;

use crate::chunking::{chunker_for, run_chunking, Chunker};
use crate::config::Config;
use crate::embeddings::embedder_from_config;
use crate::ingestion;
use crate::vector_store::{index_chunks, store_from_config};

pub fn ingest(config: &Config) -> Result<usize> {
    let documents = ingestion::ingest(&config.raw_dir(), &config.documents_path())
        .context("Ingestion failed")?;
    println!(
        "Ingested {} documents into {}",
        documents.len(),
        config.documents_path().display()
    );
    Ok(documents.len())
}

/// `strategies` overrides the configured chunkers when non-empty.
pub fn chunk(config: &Config, strategies: &[String]) -> Result<usize> {
    let selected: &[String] = if strategies.is_empty() {
        &config.chunking.strategies
    } else {
        strategies
    };

    let chunkers = selected
        .iter()
        .map(|name| chunker_for(name, &config.chunking))
        .collect::<crate::Result<Vec<Box<dyn Chunker>>>>()?;
    info!(strategies = ?selected, "Chunking documents");

    let count = run_chunking(&config.documents_path(), &config.chunks_path(), &chunkers)
        .context("Chunking failed")?;
    println!("Wrote {} chunks to {}", count, config.chunks_path().display());
    Ok(count)
}

pub async fn index(config: &Config) -> Result<usize> {
    let embedder = embedder_from_config(config)?;
    let store = store_from_config(config, embedder.dimension()).await?;

    // Rebuilds from scratch so positions line up with chunks.jsonl.
    store.clear().await?;
    let count = index_chunks(&config.chunks_path(), embedder, store)
        .await
        .context("Indexing failed")?;
    println!("Indexed {} chunks", count);
    Ok(count)
}
