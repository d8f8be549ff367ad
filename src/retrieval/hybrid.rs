//! Hybrid retrieval with a two-tier fallback.
//!
//! The primary path runs vector search, entity extraction, graph expansion
//! (only when entities were found) and ranking, then truncates to `top_k`.
//! Any failure switches to a vector-only retry; if that fails too the result
//! is empty. Callers always get a list.

use std::sync::Arc;

use tracing::{debug, error};

use super::ranker::{normalize_weights, rank};
use super::types::ContextItem;
use super::{GraphSource, RetrievalOptions, VectorSource};
use crate::error::Result;
use crate::knowledge_graph::EntityExtractor;
use crate::observability::Observability;

pub struct HybridRetriever {
    vector: Arc<dyn VectorSource>,
    graph: Option<Arc<dyn GraphSource>>,
    extractor: EntityExtractor,
    obs: Option<Arc<Observability>>,
}

impl HybridRetriever {
    pub fn new(vector: Arc<dyn VectorSource>, graph: Arc<dyn GraphSource>) -> Self {
        Self {
            vector,
            graph: Some(graph),
            extractor: EntityExtractor::new(),
            obs: None,
        }
    }

    /// Retriever without a graph: entity expansion is skipped.
    pub fn vector_only(vector: Arc<dyn VectorSource>) -> Self {
        Self {
            vector,
            graph: None,
            extractor: EntityExtractor::new(),
            obs: None,
        }
    }

    pub fn with_observability(mut self, obs: Arc<Observability>) -> Self {
        self.obs = Some(obs);
        self
    }

    pub fn has_graph(&self) -> bool {
        self.graph.is_some()
    }

    pub async fn retrieve(&self, query: &str, options: &RetrievalOptions) -> Vec<ContextItem> {
        let mut timer = self.obs.as_ref().map(|o| o.timer("retrieval.hybrid"));

        match self.retrieve_ranked(query, options).await {
            Ok(items) => items,
            Err(e) => {
                error!("Error in hybrid retrieval: {}", e);
                if let Some(t) = timer.as_mut() {
                    t.mark_failed();
                }
                self.fallback(query, options).await
            }
        }
    }

    async fn retrieve_ranked(
        &self,
        query: &str,
        options: &RetrievalOptions,
    ) -> Result<Vec<ContextItem>> {
        let vector_results = self.vector.retrieve(query, options.top_k).await?;
        debug!("Vector retrieval returned {} results", vector_results.len());

        let entities = self.extractor.entity_names(query);
        debug!("Extracted entities: {:?}", entities);

        let graph_results = match &self.graph {
            Some(graph) if !entities.is_empty() => {
                let results = graph
                    .retrieve(query, Some(&entities), options.graph_depth)
                    .await?;
                debug!("Graph retrieval returned {} results", results.len());
                results
            }
            _ => Vec::new(),
        };

        let mut ranked = rank(
            &vector_results,
            &graph_results,
            options.vector_weight,
            options.graph_weight,
        );
        ranked.truncate(options.top_k);
        Ok(ranked)
    }

    /// Vector results in their search order, without ranking.
    async fn fallback(&self, query: &str, options: &RetrievalOptions) -> Vec<ContextItem> {
        match self.vector.retrieve(query, options.top_k).await {
            Ok(hits) => {
                let (vector_weight, _) =
                    normalize_weights(options.vector_weight, options.graph_weight);
                hits.iter()
                    .take(options.top_k)
                    .map(|hit| ContextItem::from_vector(hit, vector_weight))
                    .collect()
            }
            Err(e) => {
                error!("Fallback retrieval also failed: {}", e);
                Vec::new()
            }
        }
    }
}
