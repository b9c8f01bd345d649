//! Embedding providers for Ocean
//!
//! Implementations of `ocean_core::traits::EmbeddingProvider`:
//! an HTTP provider for a remote embedding API and a deterministic mock
//! for tests and offline development.

pub mod http;
pub mod mock;

pub use http::HttpEmbeddingProvider;
pub use mock::MockEmbeddingProvider;

use ocean_core::{OceanConfig, Result};
use std::sync::Arc;

use ocean_core::traits::EmbeddingProvider;

/// Create the embedding provider configured for this deployment.
///
/// An empty API key selects the mock provider, which keeps local and
/// test environments independent of any embedding service.
pub fn create_provider(config: &OceanConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    if config.api_key.is_empty() {
        Ok(Arc::new(MockEmbeddingProvider::new(
            config.embedding_dimensions,
        )))
    } else {
        Ok(Arc::new(HttpEmbeddingProvider::new(config)?))
    }
}
