//! Domain types for the Ocean workspace

pub mod block;
pub mod content;
pub mod link;
pub mod page;
pub mod search;
pub mod tag;

pub use block::{Block, BlockProperties};
pub use content::{BlockContent, BlockType};
pub use link::{Backlink, Link, LinkTarget, LinkType};
pub use page::{Page, PageFilter};
pub use search::{
    MatchType, SearchFilters, SearchMode, SearchRequest, SearchResult, DEFAULT_LIMIT,
    DEFAULT_THRESHOLD,
};
pub use tag::Tag;
