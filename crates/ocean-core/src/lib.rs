//! Ocean core domain layer
//!
//! Domain types, the error taxonomy, configuration, and the abstract
//! collaborator traits (document store, vector index, embedding
//! provider) for the block-based knowledge workspace. This crate does no
//! I/O; everything effectful lives behind the traits and is implemented
//! by `ocean-store` and `ocean-embeddings`, then orchestrated by
//! `ocean-workspace`.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::OceanConfig;
pub use error::{OceanError, Result};
pub use traits::{
    cosine_similarity, normalize_embedding, BlockFilter, DocumentStore, EmbeddingProvider,
    LinkFilter, VectorFilter, VectorHit, VectorIndex, VectorMetadata,
};
pub use types::{
    Backlink, Block, BlockContent, BlockProperties, BlockType, Link, LinkTarget, LinkType,
    MatchType, Page, PageFilter, SearchFilters, SearchMode, SearchRequest, SearchResult, Tag,
};
