//! Tag management
//!
//! Tags are tenant-scoped labels with a denormalized `usage_count` that
//! mirrors the number of blocks referencing them. This service owns the
//! bookkeeping: assignment increments, removal decrements (floored at
//! zero), and deletion cascades removal from every block first.
//!
//! Assignment and removal rewrite the whole block record, so they take
//! the same per-page lock the position manager uses and re-read the
//! block inside the guard.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use ocean_core::{Block, BlockFilter, DocumentStore, OceanError, Result, Tag};

use crate::locks::ScopeLocks;

/// Upper bound when scanning blocks for a cascade removal
const CASCADE_SCAN_LIMIT: usize = 10_000;

/// Sort order for tag listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagSort {
    /// Most-used first, name as tiebreaker
    #[default]
    Usage,
    /// Alphabetical
    Name,
}

/// Input for creating a tag
#[derive(Debug, Clone, Default)]
pub struct NewTag {
    pub name: String,
    pub color: Option<String>,
    pub description: Option<String>,
}

impl NewTag {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Partial update for a tag; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct TagPatch {
    pub name: Option<String>,
    pub color: Option<Option<String>>,
    pub description: Option<Option<String>>,
}

/// Service for tags and their block assignments
#[derive(Clone)]
pub struct TagService {
    store: Arc<dyn DocumentStore>,
    page_locks: Arc<ScopeLocks>,
}

impl TagService {
    /// `page_locks` must be the same registry shared with every other
    /// service that writes block records (see [`crate::OceanWorkspace`])
    pub fn new(store: Arc<dyn DocumentStore>, page_locks: Arc<ScopeLocks>) -> Self {
        Self { store, page_locks }
    }

    /// Create a tag; names are unique within the tenant
    pub async fn create_tag(&self, org_id: &str, new: NewTag) -> Result<Tag> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(OceanError::validation("tag name must not be empty"));
        }
        self.ensure_unique_name(org_id, &name, None).await?;

        let mut tag = Tag::new(org_id, name);
        tag.color = new.color;
        tag.description = new.description;
        self.store.insert_tag(tag.clone()).await?;
        debug!(tag_id = %tag.id, org_id, name = %tag.name, "created tag");
        Ok(tag)
    }

    /// Fetch a tag within the caller's tenant
    pub async fn get_tag(&self, org_id: &str, id: Uuid) -> Result<Tag> {
        self.store
            .get_tag(org_id, id)
            .await?
            .ok_or(OceanError::not_found("tag", id))
    }

    /// List all tags in the tenant, sorted
    pub async fn list_tags(&self, org_id: &str, sort: TagSort) -> Result<Vec<Tag>> {
        let mut tags = self.store.list_tags(org_id).await?;
        match sort {
            TagSort::Usage => tags.sort_by(|a, b| {
                b.usage_count
                    .cmp(&a.usage_count)
                    .then_with(|| a.name.cmp(&b.name))
            }),
            TagSort::Name => tags.sort_by(|a, b| a.name.cmp(&b.name)),
        }
        Ok(tags)
    }

    /// Apply a partial update; a rename keeps tenant-scoped uniqueness
    pub async fn update_tag(&self, org_id: &str, id: Uuid, patch: TagPatch) -> Result<Tag> {
        let mut tag = self.get_tag(org_id, id).await?;

        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(OceanError::validation("tag name must not be empty"));
            }
            if name != tag.name {
                self.ensure_unique_name(org_id, &name, Some(id)).await?;
                tag.name = name;
            }
        }
        if let Some(color) = patch.color {
            tag.color = color;
        }
        if let Some(description) = patch.description {
            tag.description = description;
        }

        tag.updated_at = Utc::now();
        self.store.update_tag(&tag).await?;
        Ok(tag)
    }

    /// Delete a tag, first removing it from every block referencing it
    pub async fn delete_tag(&self, org_id: &str, id: Uuid) -> Result<()> {
        self.get_tag(org_id, id).await?;

        let filter = BlockFilter {
            tag_ids: vec![id],
            ..Default::default()
        };
        let (tagged, _) = self
            .store
            .list_blocks(org_id, &filter, CASCADE_SCAN_LIMIT, 0)
            .await?;

        let mut by_page: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for block in &tagged {
            by_page.entry(block.page_id).or_default().push(block.id);
        }

        // Cascade one page at a time under that page's lock, re-reading
        // each block inside the guard before the whole-record write.
        let mut cascade_count = 0usize;
        for (page_id, block_ids) in by_page {
            let lock = self.page_locks.lock_for(&page_id.to_string());
            let _guard = lock.lock().await;

            let mut updated = Vec::with_capacity(block_ids.len());
            for block_id in block_ids {
                let Some(mut block) = self.store.get_block(org_id, block_id).await? else {
                    continue;
                };
                if !block.properties.has_tag(id) {
                    continue;
                }
                block.properties.tag_ids.retain(|tag_id| *tag_id != id);
                block.touch();
                updated.push(block);
            }
            cascade_count += updated.len();
            if !updated.is_empty() {
                self.store.update_blocks(&updated).await?;
            }
        }

        self.store.delete_tag(org_id, id).await?;
        debug!(tag_id = %id, cascade_count, "deleted tag");
        Ok(())
    }

    /// Assign a tag to a block. Assigning a tag the block already
    /// carries is a [`OceanError::Conflict`] and leaves the usage count
    /// unchanged.
    pub async fn assign_tag(&self, org_id: &str, block_id: Uuid, tag_id: Uuid) -> Result<Tag> {
        let page_id = self.require_block(org_id, block_id).await?.page_id;
        let lock = self.page_locks.lock_for(&page_id.to_string());
        let _guard = lock.lock().await;

        let mut block = self.require_block(org_id, block_id).await?;
        let mut tag = self.get_tag(org_id, tag_id).await?;

        if block.properties.has_tag(tag_id) {
            return Err(OceanError::conflict(format!(
                "tag '{}' is already assigned to block {block_id}",
                tag.name
            )));
        }

        block.properties.tag_ids.push(tag_id);
        block.touch();
        self.store.update_block(&block).await?;

        tag.increment_usage();
        self.store.update_tag(&tag).await?;
        debug!(tag_id = %tag_id, block_id = %block_id, usage = tag.usage_count, "assigned tag");
        Ok(tag)
    }

    /// Remove a tag from a block, decrementing usage (floored at zero)
    pub async fn remove_tag(&self, org_id: &str, block_id: Uuid, tag_id: Uuid) -> Result<Tag> {
        let page_id = self.require_block(org_id, block_id).await?.page_id;
        let lock = self.page_locks.lock_for(&page_id.to_string());
        let _guard = lock.lock().await;

        let mut block = self.require_block(org_id, block_id).await?;
        let mut tag = self.get_tag(org_id, tag_id).await?;

        if !block.properties.has_tag(tag_id) {
            return Err(OceanError::validation(format!(
                "tag '{}' is not assigned to block {block_id}",
                tag.name
            )));
        }

        block.properties.tag_ids.retain(|id| *id != tag_id);
        block.touch();
        self.store.update_block(&block).await?;

        tag.decrement_usage();
        self.store.update_tag(&tag).await?;
        debug!(tag_id = %tag_id, block_id = %block_id, usage = tag.usage_count, "removed tag");
        Ok(tag)
    }

    /// The resolved tags on a block, most-used first. Tag ids whose tag
    /// has since been deleted are skipped.
    pub async fn block_tags(&self, org_id: &str, block_id: Uuid) -> Result<Vec<Tag>> {
        let block = self.require_block(org_id, block_id).await?;

        let mut tags = Vec::with_capacity(block.properties.tag_ids.len());
        for tag_id in &block.properties.tag_ids {
            if let Some(tag) = self.store.get_tag(org_id, *tag_id).await? {
                tags.push(tag);
            }
        }
        tags.sort_by(|a, b| {
            b.usage_count
                .cmp(&a.usage_count)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(tags)
    }

    async fn require_block(&self, org_id: &str, block_id: Uuid) -> Result<Block> {
        self.store
            .get_block(org_id, block_id)
            .await?
            .ok_or(OceanError::not_found("block", block_id))
    }

    async fn ensure_unique_name(
        &self,
        org_id: &str,
        name: &str,
        exclude: Option<Uuid>,
    ) -> Result<()> {
        let tags = self.store.list_tags(org_id).await?;
        if tags
            .iter()
            .any(|t| t.name == name && Some(t.id) != exclude)
        {
            return Err(OceanError::conflict(format!("tag '{name}' already exists")));
        }
        Ok(())
    }
}
