//! Collaborator abstractions
//!
//! Core defines the traits; infrastructure crates implement them. This
//! keeps services testable against in-memory doubles and makes backend
//! swaps a wiring change rather than a rewrite.

pub mod embedding;
pub mod store;
pub mod vector;

pub use embedding::{cosine_similarity, normalize_embedding, EmbeddingProvider};
pub use store::{BlockFilter, DocumentStore, LinkFilter};
pub use vector::{VectorFilter, VectorHit, VectorIndex, VectorMetadata};
