//! Embedding generation using the OpenAI API

use async_openai::{
    config::OpenAIConfig,
    types::{CreateEmbeddingRequestArgs, EmbeddingInput},
    Client as OpenAIClient,
};
use async_trait::async_trait;
use tracing::{debug, info};

use super::Embedder;
use crate::error::{Error, Result};

const MAX_INPUT_CHARS: usize = 8000;

/// Hosted embedding provider.
pub struct OpenAiEmbedder {
    client: OpenAIClient<OpenAIConfig>,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(api_key: &str, model: &str, base_url: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::Config("OPENAI_API_KEY not set".to_string()));
        }

        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);

        Ok(Self {
            client: OpenAIClient::with_config(config),
            model: model.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        // The API rejects empty inputs; those positions get zero vectors.
        let processed: Vec<String> = texts
            .iter()
            .map(|t| t.trim().chars().take(MAX_INPUT_CHARS).collect::<String>())
            .filter(|t| !t.is_empty())
            .collect();

        if processed.is_empty() {
            return Ok(vec![vec![0.0; self.dimension()]; texts.len()]);
        }

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::StringArray(processed))
            .build()
            .map_err(|e| Error::Embedding(e.to_string()))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| Error::Embedding(format!("Failed to embed texts with OpenAI: {}", e)))?;

        info!(
            "Generated {} embeddings, tokens used: {}",
            response.data.len(),
            response.usage.total_tokens
        );

        let mut result = Vec::with_capacity(texts.len());
        let mut embed_iter = response.data.into_iter();

        for text in texts {
            if text.trim().is_empty() {
                result.push(vec![0.0; self.dimension()]);
            } else {
                let embedding = embed_iter.next().ok_or_else(|| {
                    Error::Embedding("OpenAI returned fewer embeddings than inputs".to_string())
                })?;
                result.push(embedding.embedding);
            }
        }

        Ok(result)
    }

    fn dimension(&self) -> usize {
        match self.model.as_str() {
            "text-embedding-3-large" => 3072,
            _ => 1536,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_key() {
        let err = OpenAiEmbedder::new("  ", "text-embedding-3-small", "http://localhost")
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn dimension_depends_on_model() {
        let small =
            OpenAiEmbedder::new("test_key", "text-embedding-3-small", "http://localhost").unwrap();
        let large =
            OpenAiEmbedder::new("test_key", "text-embedding-3-large", "http://localhost").unwrap();
        let ada =
            OpenAiEmbedder::new("test_key", "text-embedding-ada-002", "http://localhost").unwrap();

        assert_eq!(small.dimension(), 1536);
        assert_eq!(large.dimension(), 3072);
        assert_eq!(ada.dimension(), 1536);
        assert_eq!(small.model(), "text-embedding-3-small");
    }

    #[tokio::test]
    async fn empty_batch_skips_the_network() {
        let embedder =
            OpenAiEmbedder::new("test_key", "text-embedding-3-small", "http://127.0.0.1:1").unwrap();
        assert!(embedder.embed(&[]).await.unwrap().is_empty());

        let blanks = embedder
            .embed(&["   ".to_string(), String::new()])
            .await
            .unwrap();
        assert_eq!(blanks.len(), 2);
        assert_eq!(blanks[0].len(), 1536);
    }

    #[tokio::test]
    #[ignore] // Requires OPENAI_API_KEY
    async fn embeds_against_live_api() {
        let key = std::env::var("OPENAI_API_KEY").unwrap();
        let embedder =
            OpenAiEmbedder::new(&key, "text-embedding-3-small", crate::config::OPENAI_API_URL)
                .unwrap();
        let vectors = embedder.embed(&["Energy policy".to_string()]).await.unwrap();
        assert_eq!(vectors[0].len(), 1536);
    }
}
