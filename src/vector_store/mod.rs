//! Nearest-neighbour storage for chunk embeddings.
//!
//! Two backends implement [`VectorStore`]: the in-process [`FlatIndex`]
//! persisted as JSON, and [`QdrantStore`] backed by a Qdrant collection.
//! Both report scores as cosine similarity, so higher means more similar
//! and results arrive sorted by descending score.

pub mod flat;
pub mod qdrant;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::document::{read_jsonl, Document, Metadata};
use crate::embeddings::Embedder;
use crate::error::{Error, Result};

pub use flat::FlatIndex;
pub use qdrant::QdrantStore;

const EMBED_BATCH_SIZE: usize = 64;

/// One search hit: the positional index of the stored vector, its cosine
/// similarity to the query and the metadata stored with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMatch {
    pub index: usize,
    pub score: f32,
    pub metadata: Metadata,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Append vectors; positional indexes continue from the current length.
    async fn add(&self, vectors: Vec<Vec<f32>>, metadata: Vec<Metadata>) -> Result<()>;

    /// Up to `k` matches ordered by descending similarity.
    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<StoredMatch>>;

    async fn len(&self) -> Result<usize>;

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Drop every stored vector.
    async fn clear(&self) -> Result<()>;

    /// Flush state to durable storage. Server-backed stores persist on write.
    async fn persist(&self) -> Result<()> {
        Ok(())
    }
}

pub(crate) fn check_lengths(vectors: &[Vec<f32>], metadata: &[Metadata]) -> Result<()> {
    if vectors.len() != metadata.len() {
        return Err(Error::InvalidArgument(format!(
            "{} vectors but {} metadata records",
            vectors.len(),
            metadata.len()
        )));
    }
    Ok(())
}

/// Open the backend named by `vector_store.backend`.
pub async fn store_from_config(config: &Config, dimension: usize) -> Result<Arc<dyn VectorStore>> {
    match config.vector_store.backend.to_lowercase().as_str() {
        "flat" => Ok(Arc::new(FlatIndex::open(config.index_path())?)),
        "qdrant" => {
            let store = QdrantStore::connect(
                &config.vector_store.qdrant_url,
                &config.vector_store.collection,
                dimension,
            )
            .await?;
            Ok(Arc::new(store))
        }
        other => Err(Error::Config(format!(
            "Unsupported vector store backend: {}",
            other
        ))),
    }
}

/// Embeds documents in batches and appends them to a store.
pub struct Indexer {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    batch_size: usize,
}

impl Indexer {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            store,
            batch_size: EMBED_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Index `documents` in order; returns how many were added.
    pub async fn index_documents(&self, documents: &[Document]) -> Result<usize> {
        let mut added = 0;

        for batch in documents.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|d| d.content.clone()).collect();
            let vectors = self.embedder.embed(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(Error::Embedding(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    vectors.len()
                )));
            }

            let metadata = batch.iter().map(|d| d.metadata.clone()).collect();
            self.store.add(vectors, metadata).await?;
            added += batch.len();
            debug!(added, total = documents.len(), "Indexed batch");
        }

        Ok(added)
    }
}

/// Index every chunk of `chunks_file` and persist the store.
pub async fn index_chunks(
    chunks_file: &Path,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
) -> Result<usize> {
    let chunks = read_jsonl(chunks_file)?;
    if chunks.is_empty() {
        warn!(path = %chunks_file.display(), "No chunks to index");
    }

    let added = Indexer::new(embedder, store.clone())
        .index_documents(&chunks)
        .await?;
    store.persist().await?;

    info!(chunks = added, "Vector index built");
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::write_jsonl;
    use crate::embeddings::HashEmbedder;
    use serde_json::json;

    fn doc(content: &str, source: &str) -> Document {
        let mut metadata = Metadata::new();
        metadata.insert("source".into(), json!(source));
        Document::new(content, metadata)
    }

    #[tokio::test]
    async fn indexer_adds_every_document_in_batches() {
        let store = Arc::new(FlatIndex::new());
        let indexer = Indexer::new(Arc::new(HashEmbedder::new(32)), store.clone())
            .with_batch_size(2);

        let docs = vec![
            doc("energy policy", "a.md"),
            doc("grid team", "b.md"),
            doc("billing system", "c.md"),
        ];
        let added = indexer.index_documents(&docs).await.unwrap();

        assert_eq!(added, 3);
        assert_eq!(store.len().await.unwrap(), 3);

        let hits = store
            .search(&HashEmbedder::new(32).embed_text("grid team"), 1)
            .await
            .unwrap();
        assert_eq!(hits[0].index, 1);
        assert_eq!(hits[0].metadata["source"], json!("b.md"));
    }

    #[tokio::test]
    async fn index_chunks_persists_flat_index() {
        let dir = tempfile::tempdir().unwrap();
        let chunks_path = dir.path().join("chunks.jsonl");
        let index_path = dir.path().join("vector_store").join("index.json");
        write_jsonl(
            &chunks_path,
            &[doc("first chunk", "a.md"), doc("second chunk", "a.md")],
        )
        .unwrap();

        let store = Arc::new(FlatIndex::open(&index_path).unwrap());
        let added = index_chunks(&chunks_path, Arc::new(HashEmbedder::new(16)), store)
            .await
            .unwrap();

        assert_eq!(added, 2);
        let reloaded = FlatIndex::open(&index_path).unwrap();
        assert_eq!(reloaded.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn index_chunks_missing_file_is_an_error() {
        let store = Arc::new(FlatIndex::new());
        let result = index_chunks(
            Path::new("/nonexistent/chunks.jsonl"),
            Arc::new(HashEmbedder::new(16)),
            store,
        )
        .await;
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn check_lengths_rejects_mismatch() {
        let err = check_lengths(&[vec![1.0]], &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn unknown_backend_is_rejected() {
        let mut config = Config::default();
        config.vector_store.backend = "faiss".to_string();
        let err = store_from_config(&config, 8).await.err().unwrap();
        assert!(err.to_string().contains("faiss"));
    }
}
