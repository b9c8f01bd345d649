//! Page lifecycle
//!
//! Pages are created at the end of their sibling group, archived instead
//! of deleted, and re-parented by appending to the new parent's
//! children. Page positions are ordering hints only; the dense-position
//! invariant belongs to blocks, not pages.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use ocean_core::{DocumentStore, OceanError, Page, PageFilter, Result};

/// Default page size for listings
pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Input for creating a page
#[derive(Debug, Clone, Default)]
pub struct NewPage {
    pub title: String,
    pub icon: Option<String>,
    pub cover_image: Option<String>,
    pub parent_page_id: Option<Uuid>,
}

impl NewPage {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Partial update for a page; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct PagePatch {
    pub title: Option<String>,
    pub icon: Option<String>,
    pub cover_image: Option<Option<String>>,
    pub is_favorite: Option<bool>,
    pub metadata: Option<std::collections::BTreeMap<String, serde_json::Value>>,
}

/// Service for page CRUD and hierarchy moves
#[derive(Clone)]
pub struct PageService {
    store: Arc<dyn DocumentStore>,
}

impl PageService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a page at the end of its sibling group
    pub async fn create_page(
        &self,
        org_id: &str,
        user_id: &str,
        new: NewPage,
    ) -> Result<Page> {
        if new.title.trim().is_empty() {
            return Err(OceanError::validation("page title must not be empty"));
        }
        if let Some(parent_id) = new.parent_page_id {
            self.get_page(org_id, parent_id).await?;
        }

        let position = self.sibling_count(org_id, new.parent_page_id).await?;
        let mut page = Page::new(org_id, user_id, new.title, position);
        page.parent_page_id = new.parent_page_id;
        if let Some(icon) = new.icon {
            page.icon = icon;
        }
        page.cover_image = new.cover_image;

        self.store.insert_page(page.clone()).await?;
        debug!(page_id = %page.id, org_id, position, "created page");
        Ok(page)
    }

    /// Fetch a page within the caller's tenant
    pub async fn get_page(&self, org_id: &str, id: Uuid) -> Result<Page> {
        self.store
            .get_page(org_id, id)
            .await?
            .ok_or(OceanError::not_found("page", id))
    }

    /// List pages with filters. Archived pages are excluded unless the
    /// filter asks for them.
    pub async fn list_pages(
        &self,
        org_id: &str,
        filter: &PageFilter,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<(Vec<Page>, usize)> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).max(1);
        self.store.list_pages(org_id, filter, limit, offset).await
    }

    /// Apply a partial update
    pub async fn update_page(&self, org_id: &str, id: Uuid, patch: PagePatch) -> Result<Page> {
        let mut page = self.get_page(org_id, id).await?;

        if let Some(title) = patch.title {
            if title.trim().is_empty() {
                return Err(OceanError::validation("page title must not be empty"));
            }
            page.title = title;
        }
        if let Some(icon) = patch.icon {
            page.icon = icon;
        }
        if let Some(cover_image) = patch.cover_image {
            page.cover_image = cover_image;
        }
        if let Some(is_favorite) = patch.is_favorite {
            page.is_favorite = is_favorite;
        }
        if let Some(metadata) = patch.metadata {
            page.metadata = metadata;
        }

        page.touch();
        self.store.update_page(&page).await?;
        Ok(page)
    }

    /// Soft delete: archive the page, keeping its blocks
    pub async fn delete_page(&self, org_id: &str, id: Uuid) -> Result<Page> {
        let mut page = self.get_page(org_id, id).await?;
        page.is_archived = true;
        page.touch();
        self.store.update_page(&page).await?;
        debug!(page_id = %id, org_id, "archived page");
        Ok(page)
    }

    /// Re-parent a page, appending it to the new parent's children.
    /// `None` moves the page to the root level.
    pub async fn move_page(
        &self,
        org_id: &str,
        id: Uuid,
        new_parent_id: Option<Uuid>,
    ) -> Result<Page> {
        let mut page = self.get_page(org_id, id).await?;
        if new_parent_id == Some(id) {
            return Err(OceanError::validation("cannot move a page under itself"));
        }
        if let Some(parent_id) = new_parent_id {
            self.get_page(org_id, parent_id).await?;
        }

        page.parent_page_id = new_parent_id;
        page.position = self.sibling_count(org_id, new_parent_id).await?;
        page.touch();
        self.store.update_page(&page).await?;
        debug!(page_id = %id, new_parent = ?new_parent_id, "moved page");
        Ok(page)
    }

    async fn sibling_count(&self, org_id: &str, parent_id: Option<Uuid>) -> Result<usize> {
        let filter = PageFilter {
            parent_page_id: Some(parent_id),
            ..Default::default()
        };
        let (_, total) = self.store.list_pages(org_id, &filter, 1, 0).await?;
        Ok(total)
    }
}
