//! Deterministic mock embedding provider
//!
//! Maps each lower-cased word to a dimension bucket by hash and counts
//! occurrences, then L2-normalizes. Identical texts embed identically and
//! texts sharing words land close in cosine space, which is enough to
//! exercise the full search path without a model.

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use ocean_core::traits::embedding::{normalize_embedding, EmbeddingProvider};
use ocean_core::{OceanError, Result};

/// Hash-bucketed bag-of-words embedder for tests and local mode
pub struct MockEmbeddingProvider {
    dimensions: usize,
}

impl MockEmbeddingProvider {
    /// Create a provider producing vectors of the given dimensionality
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for word in text.to_lowercase().split_whitespace() {
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            let bucket = (hasher.finish() as usize) % self.dimensions;
            vector[bucket] += 1.0;
        }
        normalize_embedding(&mut vector);
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.dimensions == 0 {
            return Err(OceanError::upstream("mock provider has zero dimensions"));
        }
        Ok(self.embed_text(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| Ok(self.embed_text(t))).collect()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model(&self) -> &str {
        "mock-bag-of-words"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocean_core::traits::cosine_similarity;

    #[tokio::test]
    async fn identical_texts_embed_identically() {
        let provider = MockEmbeddingProvider::new(64);
        let a = provider.embed("machine learning notes").await.unwrap();
        let b = provider.embed("machine learning notes").await.unwrap();
        assert_eq!(a, b);
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn shared_words_score_higher_than_disjoint() {
        let provider = MockEmbeddingProvider::new(64);
        let query = provider.embed("machine learning").await.unwrap();
        let related = provider.embed("machine learning models").await.unwrap();
        let unrelated = provider.embed("grocery list apples").await.unwrap();

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[tokio::test]
    async fn batch_preserves_order() {
        let provider = MockEmbeddingProvider::new(32);
        let texts = vec!["one".to_string(), "two".to_string()];
        let batch = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], provider.embed("one").await.unwrap());
        assert_eq!(batch[1], provider.embed("two").await.unwrap());
    }

    #[tokio::test]
    async fn vectors_are_unit_length() {
        let provider = MockEmbeddingProvider::new(16);
        let v = provider.embed("a few words here").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }
}
