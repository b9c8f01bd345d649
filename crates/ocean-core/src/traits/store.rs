//! Document store abstraction
//!
//! A namespaced record store for pages, blocks, links, and tags. Core
//! defines the trait; `ocean-store` provides the remote HTTP client and
//! the in-memory implementation.
//!
//! Consistency: implementations should provide read-after-write through a
//! single handle where they can (the in-memory store does); the remote
//! backend is documented as eventually consistent, and services are
//! written so correctness never depends on immediately re-reading a write
//! they already hold in memory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::types::block::Block;
use crate::types::content::BlockType;
use crate::types::link::{Link, LinkTarget};
use crate::types::page::{Page, PageFilter};
use crate::types::tag::Tag;

/// Filters for listing blocks
#[derive(Debug, Clone, Default)]
pub struct BlockFilter {
    /// Restrict to one page
    pub page_id: Option<Uuid>,

    /// Restrict to these block types (empty = all)
    pub block_types: Vec<BlockType>,

    /// Restrict to children of this parent block
    pub parent_block_id: Option<Uuid>,

    /// Require all of these tags
    pub tag_ids: Vec<Uuid>,

    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

impl BlockFilter {
    /// Filter scoped to a single page
    pub fn for_page(page_id: Uuid) -> Self {
        Self {
            page_id: Some(page_id),
            ..Default::default()
        }
    }

    /// Whether a block passes every filter
    pub fn matches(&self, block: &Block) -> bool {
        if let Some(page_id) = self.page_id {
            if block.page_id != page_id {
                return false;
            }
        }
        if !self.block_types.is_empty() && !self.block_types.contains(&block.block_type()) {
            return false;
        }
        if let Some(parent) = self.parent_block_id {
            if block.parent_block_id != Some(parent) {
                return false;
            }
        }
        if !self
            .tag_ids
            .iter()
            .all(|tag| block.properties.has_tag(*tag))
        {
            return false;
        }
        if let Some(after) = self.created_after {
            if block.created_at < after {
                return false;
            }
        }
        if let Some(before) = self.created_before {
            if block.created_at > before {
                return false;
            }
        }
        true
    }
}

/// Filters for listing links
#[derive(Debug, Clone, Default)]
pub struct LinkFilter {
    /// Restrict to links from this source block
    pub source_block_id: Option<Uuid>,

    /// Restrict to links pointing at this target
    pub target_id: Option<Uuid>,

    /// Restrict to this target kind
    pub target: Option<LinkTarget>,
}

impl LinkFilter {
    /// Whether a link passes every filter
    pub fn matches(&self, link: &Link) -> bool {
        if let Some(source) = self.source_block_id {
            if link.source_block_id != source {
                return false;
            }
        }
        if let Some(target_id) = self.target_id {
            if link.target_id != target_id {
                return false;
            }
        }
        if let Some(target) = self.target {
            if link.target != target {
                return false;
            }
        }
        true
    }
}

/// Namespaced record store for all workspace entities.
///
/// Every read and write is tenant-scoped: records are only visible under
/// their own `org_id`. Listing methods return `(rows, total_count)` where
/// the total ignores limit/offset.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // --- pages ---

    async fn insert_page(&self, page: Page) -> Result<()>;

    async fn get_page(&self, org_id: &str, id: Uuid) -> Result<Option<Page>>;

    async fn list_pages(
        &self,
        org_id: &str,
        filter: &PageFilter,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<Page>, usize)>;

    /// Whole-record write keyed by `(org_id, id)`
    async fn update_page(&self, page: &Page) -> Result<()>;

    // --- blocks ---

    async fn insert_block(&self, block: Block) -> Result<()>;

    async fn insert_blocks(&self, blocks: Vec<Block>) -> Result<()>;

    async fn get_block(&self, org_id: &str, id: Uuid) -> Result<Option<Block>>;

    /// Page-scoped listings come back ordered by position; unscoped
    /// listings by creation time descending.
    async fn list_blocks(
        &self,
        org_id: &str,
        filter: &BlockFilter,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<Block>, usize)>;

    /// Whole-record write keyed by `(org_id, id)`
    async fn update_block(&self, block: &Block) -> Result<()>;

    /// Write several blocks as one operation. Used by the position
    /// manager to resequence a page in a single store round-trip.
    async fn update_blocks(&self, blocks: &[Block]) -> Result<()>;

    /// Returns whether the block existed
    async fn delete_block(&self, org_id: &str, id: Uuid) -> Result<bool>;

    async fn count_blocks(&self, org_id: &str, page_id: Uuid) -> Result<usize>;

    // --- links ---

    async fn insert_link(&self, link: Link) -> Result<()>;

    async fn get_link(&self, org_id: &str, id: Uuid) -> Result<Option<Link>>;

    async fn list_links(&self, org_id: &str, filter: &LinkFilter) -> Result<Vec<Link>>;

    /// Returns whether the link existed
    async fn delete_link(&self, org_id: &str, id: Uuid) -> Result<bool>;

    // --- tags ---

    async fn insert_tag(&self, tag: Tag) -> Result<()>;

    async fn get_tag(&self, org_id: &str, id: Uuid) -> Result<Option<Tag>>;

    async fn list_tags(&self, org_id: &str) -> Result<Vec<Tag>>;

    /// Whole-record write keyed by `(org_id, id)`
    async fn update_tag(&self, tag: &Tag) -> Result<()>;

    /// Returns whether the tag existed
    async fn delete_tag(&self, org_id: &str, id: Uuid) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::content::BlockContent;

    #[test]
    fn block_filter_date_range() {
        let block = Block::new(
            Uuid::new_v4(),
            "org",
            "user",
            BlockContent::Text { text: "x".into() },
            0,
        );

        let open = BlockFilter::default();
        assert!(open.matches(&block));

        let future_only = BlockFilter {
            created_after: Some(block.created_at + chrono::Duration::days(1)),
            ..Default::default()
        };
        assert!(!future_only.matches(&block));

        let past_only = BlockFilter {
            created_before: Some(block.created_at - chrono::Duration::days(1)),
            ..Default::default()
        };
        assert!(!past_only.matches(&block));
    }

    #[test]
    fn link_filter_on_target_kind() {
        let link = Link::new(
            "org",
            Uuid::new_v4(),
            Uuid::new_v4(),
            LinkTarget::Block,
            crate::types::link::LinkType::Reference,
        );
        assert!(LinkFilter {
            target: Some(LinkTarget::Block),
            ..Default::default()
        }
        .matches(&link));
        assert!(!LinkFilter {
            target: Some(LinkTarget::Page),
            ..Default::default()
        }
        .matches(&link));
    }
}
