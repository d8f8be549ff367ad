//! Vector, graph and hybrid retrieval.

pub mod graph;
pub mod hybrid;
pub mod ranker;
pub mod types;
pub mod vector;

use async_trait::async_trait;

use crate::config::{
    RetrievalConfig, DEFAULT_GRAPH_DEPTH, DEFAULT_GRAPH_WEIGHT, DEFAULT_TOP_K,
    DEFAULT_VECTOR_WEIGHT,
};
use crate::error::Result;

pub use graph::GraphRetriever;
pub use hybrid::HybridRetriever;
pub use ranker::rank;
pub use types::{ContextItem, GraphHit, Source, VectorHit};
pub use vector::VectorRetriever;

/// Similarity search over indexed chunks, best match first.
#[async_trait]
pub trait VectorSource: Send + Sync {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<VectorHit>>;
}

/// Related-entity lookup in the knowledge graph.
#[async_trait]
pub trait GraphSource: Send + Sync {
    async fn retrieve(
        &self,
        query: &str,
        entities: Option<&[String]>,
        depth: usize,
    ) -> Result<Vec<GraphHit>>;
}

/// Parameters of one hybrid retrieval call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalOptions {
    pub top_k: usize,
    pub vector_weight: f32,
    pub graph_weight: f32,
    pub graph_depth: usize,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            vector_weight: DEFAULT_VECTOR_WEIGHT,
            graph_weight: DEFAULT_GRAPH_WEIGHT,
            graph_depth: DEFAULT_GRAPH_DEPTH,
        }
    }
}

impl From<&RetrievalConfig> for RetrievalOptions {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            top_k: config.top_k,
            vector_weight: config.vector_weight,
            graph_weight: config.graph_weight,
            graph_depth: config.graph_depth,
        }
    }
}
