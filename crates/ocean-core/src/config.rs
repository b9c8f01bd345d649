//! Ocean configuration
//!
//! Settings for the document store backend and the embedding provider,
//! loadable from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default embedding model identifier
pub const DEFAULT_EMBEDDING_MODEL: &str = "BAAI/bge-base-en-v1.5";

/// Default embedding dimensionality for the default model
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 768;

/// Default timeout for calls to external collaborators, in seconds
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// Configuration for the Ocean backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OceanConfig {
    /// Base URL of the remote document/vector store API
    pub api_url: String,

    /// API key for the remote store
    pub api_key: String,

    /// Project namespace within the remote store
    pub project_id: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Expected embedding dimensionality
    pub embedding_dimensions: usize,

    /// Timeout applied to each external call (embed, vector search,
    /// store read/write)
    pub upstream_timeout_secs: u64,
}

impl Default for OceanConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            api_key: String::new(),
            project_id: "default".to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            upstream_timeout_secs: DEFAULT_UPSTREAM_TIMEOUT_SECS,
        }
    }
}

impl OceanConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// Recognized variables: `OCEAN_API_URL`, `OCEAN_API_KEY`,
    /// `OCEAN_PROJECT_ID`, `OCEAN_EMBEDDINGS_MODEL`,
    /// `OCEAN_EMBEDDINGS_DIMENSIONS`, `OCEAN_UPSTREAM_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("OCEAN_API_URL") {
            config.api_url = url;
        }
        if let Ok(key) = std::env::var("OCEAN_API_KEY") {
            config.api_key = key;
        }
        if let Ok(project) = std::env::var("OCEAN_PROJECT_ID") {
            config.project_id = project;
        }
        if let Ok(model) = std::env::var("OCEAN_EMBEDDINGS_MODEL") {
            config.embedding_model = model;
        }
        if let Ok(dims) = std::env::var("OCEAN_EMBEDDINGS_DIMENSIONS") {
            if let Ok(dims) = dims.parse() {
                config.embedding_dimensions = dims;
            }
        }
        if let Ok(secs) = std::env::var("OCEAN_UPSTREAM_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.upstream_timeout_secs = secs;
            }
        }
        config
    }

    /// Timeout for external calls as a [`Duration`]
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    /// Trailing-slash-normalized API base URL
    pub fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}
