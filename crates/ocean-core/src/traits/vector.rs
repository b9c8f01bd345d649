//! Vector index abstraction
//!
//! A namespaced approximate-nearest-neighbor store. Namespaces carry the
//! tenant scope; metadata attached to each vector enables filter
//! push-down at search time (page id and block type are the filters the
//! index understands — everything else is applied locally by the search
//! orchestrator).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::types::content::BlockType;

/// Metadata stored alongside each vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorMetadata {
    pub block_id: Uuid,
    pub page_id: Uuid,
    pub block_type: BlockType,
}

/// Filters the index can push down during similarity search
#[derive(Debug, Clone, Default)]
pub struct VectorFilter {
    pub page_id: Option<Uuid>,
    pub block_type: Option<BlockType>,
}

impl VectorFilter {
    /// Whether the stored metadata passes this filter
    pub fn matches(&self, metadata: &VectorMetadata) -> bool {
        if let Some(page_id) = self.page_id {
            if metadata.page_id != page_id {
                return false;
            }
        }
        if let Some(block_type) = self.block_type {
            if metadata.block_type != block_type {
                return false;
            }
        }
        true
    }
}

/// A similarity search hit
#[derive(Debug, Clone)]
pub struct VectorHit {
    pub id: Uuid,
    pub score: f32,
    pub metadata: VectorMetadata,
}

/// Namespaced vector store with metadata filter push-down
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace a vector
    async fn upsert(
        &self,
        namespace: &str,
        id: Uuid,
        vector: Vec<f32>,
        metadata: VectorMetadata,
    ) -> Result<()>;

    /// Remove a vector; removing a missing id is not an error
    async fn delete(&self, namespace: &str, id: Uuid) -> Result<()>;

    /// Similarity search within a namespace. Returns up to `top_k` hits
    /// with score ≥ `min_score`, best first.
    async fn search(
        &self,
        namespace: &str,
        query: &[f32],
        filter: &VectorFilter,
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<VectorHit>>;
}
