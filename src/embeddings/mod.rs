//! Text embedding providers.
//!
//! [`Embedder`] is the capability every provider implements; the concrete
//! variant is chosen from configuration by [`embedder_from_config`].

pub mod hashed;
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};

pub use hashed::HashEmbedder;
pub use openai::OpenAiEmbedder;

/// Produces one vector per input text.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn dimension(&self) -> usize;

    /// Embed a single text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("No embedding returned".to_string()))
    }
}

/// Build the embedder named by `embeddings.provider`.
///
/// `local` (or `hf`) selects the offline [`HashEmbedder`]; `openai` selects
/// [`OpenAiEmbedder`] and requires an API key.
pub fn embedder_from_config(config: &Config) -> Result<Arc<dyn Embedder>> {
    match config.embeddings.provider.to_lowercase().as_str() {
        "local" | "hf" => {
            info!(dimension = config.embeddings.dimension, "Using local hashed embeddings");
            Ok(Arc::new(HashEmbedder::new(config.embeddings.dimension)))
        }
        "openai" => {
            let embedder = OpenAiEmbedder::new(
                config.require_openai_key()?,
                &config.openai.embedding_model,
                &config.openai.base_url,
            )?;
            info!(model = %config.openai.embedding_model, "Using OpenAI embeddings");
            Ok(Arc::new(embedder))
        }
        other => Err(Error::Config(format!(
            "Unsupported embedder provider: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_provider(provider: &str) -> Config {
        let mut config = Config::default();
        config.embeddings.provider = provider.to_string();
        config.embeddings.dimension = 32;
        config
    }

    #[test]
    fn local_and_hf_select_hashed_embedder() {
        for provider in ["local", "hf", "HF"] {
            let embedder = embedder_from_config(&config_with_provider(provider)).unwrap();
            assert_eq!(embedder.dimension(), 32);
        }
    }

    #[test]
    fn openai_without_key_is_a_config_error() {
        let mut config = config_with_provider("openai");
        config.openai.api_key = String::new();

        let err = embedder_from_config(&config).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn openai_with_key_selects_model_dimension() {
        let mut config = config_with_provider("openai");
        config.openai.api_key = "test_key".to_string();
        config.openai.embedding_model = "text-embedding-3-large".to_string();

        let embedder = embedder_from_config(&config).unwrap();
        assert_eq!(embedder.dimension(), 3072);
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = embedder_from_config(&config_with_provider("cohere"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("cohere"));
    }

    #[tokio::test]
    async fn embed_one_returns_single_vector() {
        let embedder = HashEmbedder::new(16);
        let vector = embedder.embed_one("grid policy").await.unwrap();
        assert_eq!(vector.len(), 16);
    }
}
