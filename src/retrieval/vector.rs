use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use super::types::VectorHit;
use super::VectorSource;
use crate::document::read_jsonl;
use crate::embeddings::Embedder;
use crate::error::Result;
use crate::observability::Observability;
use crate::vector_store::VectorStore;

/// Embeds the query and searches the store. Chunk texts are held in
/// positional order so `StoredMatch::index` selects the content.
pub struct VectorRetriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    texts: Vec<String>,
    obs: Option<Arc<Observability>>,
}

impl VectorRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>, texts: Vec<String>) -> Self {
        Self {
            embedder,
            store,
            texts,
            obs: None,
        }
    }

    /// Texts come from the `content` of each line of `chunks_path`. A missing
    /// file leaves the retriever empty.
    pub fn load(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        chunks_path: &Path,
    ) -> Result<Self> {
        let texts = if chunks_path.exists() {
            read_jsonl(chunks_path)?
                .into_iter()
                .map(|doc| doc.content)
                .collect()
        } else {
            warn!("Chunks file not found: {}", chunks_path.display());
            Vec::new()
        };

        info!("Loaded vector retriever with {} chunks", texts.len());
        Ok(Self::new(embedder, store, texts))
    }

    pub fn with_observability(mut self, obs: Arc<Observability>) -> Self {
        self.obs = Some(obs);
        self
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<VectorHit>> {
        let query_embedding = self.embedder.embed_one(query).await?;
        let matches = self.store.search(&query_embedding, top_k).await?;

        Ok(matches
            .into_iter()
            .filter(|m| m.index < self.texts.len())
            .map(|m| VectorHit {
                content: self.texts[m.index].clone(),
                score: m.score,
                index: m.index,
            })
            .collect())
    }
}

#[async_trait]
impl VectorSource for VectorRetriever {
    /// Never fails: errors are logged and yield no results.
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<VectorHit>> {
        let mut timer = self.obs.as_ref().map(|o| o.timer("retrieval.vector"));

        match self.search(query, top_k).await {
            Ok(hits) => {
                debug!("Vector retrieval returned {} results", hits.len());
                Ok(hits)
            }
            Err(e) => {
                error!("Error during vector retrieval: {}", e);
                if let Some(t) = timer.as_mut() {
                    t.mark_failed();
                }
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{write_jsonl, Document, Metadata};
    use crate::embeddings::HashEmbedder;
    use crate::error::Error;
    use crate::vector_store::FlatIndex;

    async fn indexed(texts: &[&str]) -> (Arc<dyn Embedder>, Arc<FlatIndex>) {
        let embedder = Arc::new(HashEmbedder::new(64));
        let store = Arc::new(FlatIndex::new());
        let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        let vectors = embedder.embed(&owned).await.unwrap();
        store
            .add(vectors, vec![Metadata::new(); texts.len()])
            .await
            .unwrap();
        (embedder, store)
    }

    #[tokio::test]
    async fn returns_most_similar_first() {
        let texts = ["refund policy for customers", "grid maintenance schedule"];
        let (embedder, store) = indexed(&texts).await;
        let retriever = VectorRetriever::new(
            embedder,
            store,
            texts.iter().map(|t| t.to_string()).collect(),
        );

        let hits = retriever.retrieve("grid maintenance", 2).await.unwrap();

        assert_eq!(hits[0].content, "grid maintenance schedule");
        assert_eq!(hits[0].index, 1);
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn indexes_beyond_texts_are_dropped() {
        let (embedder, store) = indexed(&["alpha", "beta", "gamma"]).await;
        let retriever = VectorRetriever::new(embedder, store, vec!["alpha".to_string()]);

        let hits = retriever.retrieve("beta", 3).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].index, 0);
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(Error::Embedding("provider down".into()))
        }

        fn dimension(&self) -> usize {
            8
        }
    }

    #[tokio::test]
    async fn errors_yield_empty_results_and_failed_timer() {
        let obs = Arc::new(Observability::new());
        let retriever = VectorRetriever::new(
            Arc::new(FailingEmbedder),
            Arc::new(FlatIndex::new()),
            vec!["a".to_string()],
        )
        .with_observability(obs.clone());

        assert!(retriever.retrieve("anything", 5).await.unwrap().is_empty());
        assert_eq!(obs.latency_stats("retrieval.vector").count, 1);
    }

    #[tokio::test]
    async fn load_reads_chunk_contents_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunks.jsonl");
        write_jsonl(
            &path,
            &[
                Document::new("first", Metadata::new()),
                Document::new("second", Metadata::new()),
            ],
        )
        .unwrap();

        let retriever = VectorRetriever::load(
            Arc::new(HashEmbedder::new(8)),
            Arc::new(FlatIndex::new()),
            &path,
        )
        .unwrap();
        assert_eq!(retriever.len(), 2);

        let missing = VectorRetriever::load(
            Arc::new(HashEmbedder::new(8)),
            Arc::new(FlatIndex::new()),
            &dir.path().join("absent.jsonl"),
        )
        .unwrap();
        assert!(missing.is_empty());
    }
}
