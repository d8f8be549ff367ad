use async_trait::async_trait;
use xxhash_rust::xxh3::xxh3_64;

use super::Embedder;
use crate::error::Result;

/// Deterministic, offline embedding: a hashed bag of lower-cased words,
/// L2-normalised so cosine similarity reduces to a dot product.
///
/// Buckets come from XXH3-64 (seed 0). Persisted indexes depend on this
/// mapping staying fixed.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(8) }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vec = vec![0.0f32; self.dim];
        for raw in text.split_whitespace() {
            let token = raw.trim_matches(|c: char| !c.is_alphanumeric());
            if token.is_empty() {
                continue;
            }
            vec[self.bucket(token)] += 1.0;
        }

        normalize(&mut vec);
        vec
    }

    fn bucket(&self, token: &str) -> usize {
        (xxh3_64(token.to_lowercase().as_bytes()) % self.dim as u64) as usize
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

pub(crate) fn normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vec.iter_mut() {
            *v /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_consistent_embeddings() {
        let embedder = HashEmbedder::new(64);
        let text = "Compliance Policy for the Grid Team";

        assert_eq!(embedder.embed_text(text), embedder.embed_text(text));
        assert_eq!(embedder.embed_text(text).len(), 64);
    }

    #[test]
    fn ignores_case_and_punctuation() {
        let embedder = HashEmbedder::new(64);
        assert_eq!(
            embedder.embed_text("Energy, policy!"),
            embedder.embed_text("energy POLICY")
        );
    }

    #[test]
    fn different_texts_differ() {
        let embedder = HashEmbedder::new(64);
        assert_ne!(
            embedder.embed_text("hello world"),
            embedder.embed_text("goodbye world")
        );
    }

    #[test]
    fn bucket_hash_is_pinned() {
        assert_eq!(xxh3_64(b"a"), 0xe6c632b61e964e1f);
        assert_eq!(xxh3_64(b"tax"), 0xba05557be002c79a);

        let embedder = HashEmbedder::new(64);
        assert_eq!(embedder.bucket("a"), 31);
        assert_eq!(embedder.bucket("TAX"), 26);

        let emb = embedder.embed_text("Tax!");
        assert_eq!(emb[26], 1.0);
    }

    #[test]
    fn respects_minimum_dimension() {
        assert_eq!(HashEmbedder::new(0).dimension(), 8);
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let emb = HashEmbedder::new(32).embed_text("");
        assert!(emb.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn normalize_scales_to_unit_length() {
        let mut vec = vec![3.0, 4.0];
        normalize(&mut vec);
        let norm = (vec[0].powi(2) + vec[1].powi(2)).sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
        assert!(vec[1] > vec[0]);
    }

    #[tokio::test]
    async fn embed_returns_one_vector_per_text() {
        let embedder = HashEmbedder::new(16);
        let vectors = embedder
            .embed(&["a".to_string(), "b c".to_string(), String::new()])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 3);
    }
}
