//! Ocean workspace services
//!
//! The service layer over `ocean-core`'s storage and embedding
//! abstractions: page and block lifecycle (including the dense block
//! position invariant), link graph integrity, tags, and hybrid search.
//! An upstream transport (HTTP, RPC) is expected to own request
//! decoding and map [`ocean_core::OceanError`] variants to its own
//! status codes.

pub mod blocks;
pub mod links;
pub mod locks;
pub mod pages;
pub mod search;
pub mod tags;

use std::sync::Arc;

use ocean_core::{DocumentStore, EmbeddingProvider, VectorIndex};

pub use blocks::{BlockEmbeddingInfo, BlockPatch, BlockService, NewBlock};
pub use links::LinkService;
pub use locks::ScopeLocks;
pub use pages::{NewPage, PagePatch, PageService};
pub use search::{RankingEngine, SearchService};
pub use tags::{NewTag, TagPatch, TagService, TagSort};

/// All services wired over one set of collaborators
#[derive(Clone)]
pub struct OceanWorkspace {
    pub pages: PageService,
    pub blocks: BlockService,
    pub links: LinkService,
    pub tags: TagService,
    pub search: SearchService,
}

impl OceanWorkspace {
    /// Wire every service over the given store, vector index, and
    /// embedding provider
    pub fn new(
        store: Arc<dyn DocumentStore>,
        vectors: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        // One page-lock registry for every service that writes block
        // records; separate registries would not exclude each other.
        let page_locks = Arc::new(ScopeLocks::new());
        Self {
            pages: PageService::new(store.clone()),
            blocks: BlockService::new(
                store.clone(),
                vectors.clone(),
                embedder.clone(),
                page_locks.clone(),
            ),
            links: LinkService::new(store.clone()),
            tags: TagService::new(store.clone(), page_locks),
            search: SearchService::new(store, vectors, embedder),
        }
    }
}

/// Char-safe truncation for content previews
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_on_char_boundaries() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("abcdef", 3), "abc...");
        // multi-byte chars count as one
        assert_eq!(preview("ééééé", 3), "ééé...");
    }
}
