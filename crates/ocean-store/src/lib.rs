//! Storage backends for Ocean
//!
//! Implementations of `ocean_core::traits::{DocumentStore, VectorIndex}`:
//! a remote HTTP client ([`RemoteStore`]) and in-memory twins
//! ([`MemoryStore`], [`MemoryVectorIndex`]) for tests and local mode.

pub mod memory;
pub mod remote;

pub use memory::{MemoryStore, MemoryVectorIndex};
pub use remote::RemoteStore;
