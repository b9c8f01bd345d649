//! Block records
//!
//! A block is an atomic content unit inside a page. Within one page the
//! `position` values of all blocks form exactly `{0, 1, ..., n-1}`; the
//! position manager in `ocean-workspace` owns that invariant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::content::{BlockContent, BlockType};

/// Free-form properties attached to a block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockProperties {
    /// Ordered set of assigned tag ids
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,

    /// Anything else (color, collapsed state, ...)
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl BlockProperties {
    /// Whether the given tag is already assigned
    pub fn has_tag(&self, tag_id: Uuid) -> bool {
        self.tag_ids.contains(&tag_id)
    }
}

/// An atomic content unit inside a page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: Uuid,
    pub page_id: Uuid,
    pub org_id: String,
    pub user_id: String,

    /// Type-specific content; the block's type is derived from it
    pub content: BlockContent,

    /// 0-based position within the page, dense across all page blocks
    pub position: usize,

    /// Parent block for nesting, if any
    pub parent_block_id: Option<Uuid>,

    #[serde(default)]
    pub properties: BlockProperties,

    /// Identifier of this block's embedding in the vector index.
    /// Present iff the block's searchable text is non-empty and the
    /// embedding was generated successfully.
    pub vector_id: Option<Uuid>,

    /// Dimensionality of the stored embedding, if any
    pub vector_dimensions: Option<usize>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Block {
    /// Build a new block at the given position
    pub fn new(
        page_id: Uuid,
        org_id: impl Into<String>,
        user_id: impl Into<String>,
        content: BlockContent,
        position: usize,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            page_id,
            org_id: org_id.into(),
            user_id: user_id.into(),
            content,
            position,
            parent_block_id: None,
            properties: BlockProperties::default(),
            vector_id: None,
            vector_dimensions: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The block's type, derived from its content variant
    pub fn block_type(&self) -> BlockType {
        self.content.block_type()
    }

    /// Text used for embedding and substring matching
    pub fn searchable_text(&self) -> String {
        self.content.searchable_text()
    }

    /// Stamp the update time
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_block_has_no_vector_reference() {
        let block = Block::new(
            Uuid::new_v4(),
            "org-1",
            "user-1",
            BlockContent::Text { text: "hi".into() },
            0,
        );
        assert!(block.vector_id.is_none());
        assert_eq!(block.block_type(), BlockType::Text);
        assert_eq!(block.position, 0);
    }

    #[test]
    fn properties_track_tag_membership() {
        let mut props = BlockProperties::default();
        let tag = Uuid::new_v4();
        assert!(!props.has_tag(tag));
        props.tag_ids.push(tag);
        assert!(props.has_tag(tag));
    }
}
