//! Wiring of retrievers and generators from configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::embeddings::embedder_from_config;
use crate::generation::{AnswerGenerator, ContextBuilder, OpenAiChat, ReasoningEngine};
use crate::knowledge_graph::{GraphClient, Neo4jClient};
use crate::observability::Observability;
use crate::retrieval::{GraphRetriever, HybridRetriever, RetrievalOptions, VectorRetriever};
use crate::vector_store::store_from_config;

/// Graph client when Neo4j is enabled and configured. An unreachable
/// server is an error; a disabled or unconfigured one is not.
pub async fn open_graph(config: &Config) -> Result<Option<Arc<dyn GraphClient>>> {
    if !config.neo4j.enabled || config.neo4j.uri.trim().is_empty() {
        info!("Neo4j not configured, graph retrieval disabled");
        return Ok(None);
    }

    let neo4j = config.require_neo4j()?;
    let client = Neo4jClient::from_config(neo4j)
        .await
        .context("Failed to open knowledge graph")?;
    Ok(Some(Arc::new(client)))
}

pub async fn build_retriever(config: &Config, obs: Arc<Observability>) -> Result<HybridRetriever> {
    let embedder = embedder_from_config(config)?;
    let store = store_from_config(config, embedder.dimension())
        .await
        .context("Failed to open vector store")?;
    let vector = VectorRetriever::load(embedder, store, &config.chunks_path())?
        .with_observability(obs.clone());

    let retriever = match open_graph(config).await? {
        Some(client) => HybridRetriever::new(
            Arc::new(vector),
            Arc::new(GraphRetriever::new(client).with_observability(obs.clone())),
        ),
        None => HybridRetriever::vector_only(Arc::new(vector)),
    };

    Ok(retriever.with_observability(obs))
}

pub async fn build_generator(config: &Config, obs: Arc<Observability>) -> Result<AnswerGenerator> {
    let chat = OpenAiChat::from_config(&config.openai)?;
    let retriever = build_retriever(config, obs.clone()).await?;
    let reasoner = ReasoningEngine::new(Arc::new(chat))
        .with_context_builder(ContextBuilder::new(config.retrieval.max_context_chars))
        .with_observability(obs);

    Ok(AnswerGenerator::new(Arc::new(retriever), reasoner)
        .with_options(RetrievalOptions::from(&config.retrieval)))
}
