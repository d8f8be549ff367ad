//! Interactive retrieval and question answering.

use std::sync::Arc;

use anyhow::Result;

use super::setup::{build_generator, build_retriever};
use crate::config::Config;
use crate::observability::Observability;
use crate::retrieval::{ContextItem, RetrievalOptions};

/// Overrides for the configured retrieval options.
#[derive(Debug, Default, Clone, Copy)]
pub struct RetrieveArgs {
    pub top_k: Option<usize>,
    pub vector_weight: Option<f32>,
    pub graph_weight: Option<f32>,
    pub depth: Option<usize>,
}

impl RetrieveArgs {
    pub fn apply(&self, mut options: RetrievalOptions) -> RetrievalOptions {
        if let Some(top_k) = self.top_k {
            options.top_k = top_k;
        }
        if let Some(w) = self.vector_weight {
            options.vector_weight = w;
        }
        if let Some(w) = self.graph_weight {
            options.graph_weight = w;
        }
        if let Some(depth) = self.depth {
            options.graph_depth = depth;
        }
        options
    }
}

pub async fn retrieve(
    config: &Config,
    obs: Arc<Observability>,
    query: &str,
    args: RetrieveArgs,
) -> Result<Vec<ContextItem>> {
    let retriever = build_retriever(config, obs).await?;
    let options = args.apply(RetrievalOptions::from(&config.retrieval));

    let items = retriever.retrieve(query, &options).await;
    if items.is_empty() {
        println!("No context found for: {}", query);
    } else {
        println!("{}", serde_json::to_string_pretty(&items)?);
    }
    Ok(items)
}

pub async fn generate(config: &Config, obs: Arc<Observability>, question: &str) -> Result<String> {
    let generator = build_generator(config, obs).await?;
    let answer = generator.answer(question).await?;
    println!("{}", answer);
    Ok(answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_given_fields() {
        let args = RetrieveArgs {
            top_k: Some(3),
            graph_weight: Some(0.5),
            ..Default::default()
        };

        let options = args.apply(RetrievalOptions::default());

        assert_eq!(options.top_k, 3);
        assert_eq!(options.graph_weight, 0.5);
        assert_eq!(options.vector_weight, RetrievalOptions::default().vector_weight);
        assert_eq!(options.graph_depth, RetrievalOptions::default().graph_depth);
    }

    #[tokio::test]
    async fn retrieve_over_empty_index_returns_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = {
            let _lock = crate::config::tests::ENV_LOCK
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            Config::default()
        };
        config.data_dir = dir.path().to_path_buf();
        config.neo4j.enabled = false;
        config.embeddings.provider = "local".to_string();
        config.vector_store.backend = "flat".to_string();

        let items = retrieve(&config, Arc::new(Observability::new()), "Finance Team", RetrieveArgs::default())
            .await
            .unwrap();
        assert!(items.is_empty());
    }
}
