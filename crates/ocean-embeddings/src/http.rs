//! HTTP embedding provider
//!
//! Talks to a remote embedding API over an OpenAI-compatible surface:
//! `POST {base}/v1/embeddings` with `{ model, input: [texts] }`. Every
//! call carries the configured timeout; failures surface as
//! `OceanError::Upstream` so callers can retry.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use ocean_core::traits::EmbeddingProvider;
use ocean_core::{OceanConfig, OceanError, Result};

/// Embedding provider backed by a remote HTTP API
pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

impl HttpEmbeddingProvider {
    /// Create a provider from configuration
    pub fn new(config: &OceanConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()
            .map_err(|e| OceanError::upstream(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_base().to_string(),
            api_key: config.api_key.clone(),
            model: config.embedding_model.clone(),
            dimensions: config.embedding_dimensions,
        })
    }

    async fn request_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        debug!(count = texts.len(), model = %self.model, "requesting embeddings");

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": self.model,
                "input": texts,
            }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OceanError::upstream("embedding request timed out")
                } else {
                    OceanError::upstream(format!("embedding request failed: {e}"))
                }
            })?;

        if !response.status().is_success() {
            return Err(OceanError::upstream(format!(
                "embedding API returned {}",
                response.status()
            )));
        }

        let body: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| OceanError::upstream(format!("invalid embedding response: {e}")))?;

        if body.data.len() != texts.len() {
            return Err(OceanError::upstream(format!(
                "embedding API returned {} vectors for {} inputs",
                body.data.len(),
                texts.len()
            )));
        }

        let mut vectors = Vec::with_capacity(body.data.len());
        for row in body.data {
            if row.embedding.len() != self.dimensions {
                return Err(OceanError::upstream(format!(
                    "embedding dimensionality mismatch: got {}, expected {}",
                    row.embedding.len(),
                    self.dimensions
                )));
            }
            vectors.push(row.embedding);
        }
        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.request_embeddings(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| OceanError::upstream("embedding API returned no vectors"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request_embeddings(texts).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_reports_configured_model() {
        let config = OceanConfig {
            api_key: "key".into(),
            ..Default::default()
        };
        let provider = HttpEmbeddingProvider::new(&config).unwrap();
        assert_eq!(provider.model(), "BAAI/bge-base-en-v1.5");
        assert_eq!(provider.dimensions(), 768);
    }

    #[tokio::test]
    async fn empty_batch_short_circuits() {
        let config = OceanConfig {
            api_key: "key".into(),
            ..Default::default()
        };
        let provider = HttpEmbeddingProvider::new(&config).unwrap();
        let vectors = provider.embed_batch(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }
}
