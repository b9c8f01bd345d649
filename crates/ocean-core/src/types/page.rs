//! Page records
//!
//! Pages are the top-level (or nested) containers of blocks. Deletion is
//! soft: an archived page is excluded from default listings but keeps its
//! blocks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Default icon for newly created pages
pub const DEFAULT_PAGE_ICON: &str = "📄";

/// A container of ordered blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: Uuid,
    pub org_id: String,
    pub user_id: String,
    pub title: String,
    pub icon: String,
    pub cover_image: Option<String>,
    pub parent_page_id: Option<Uuid>,

    /// Position among sibling pages under the same parent
    pub position: usize,

    pub is_archived: bool,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl Page {
    /// Build a new page at the given sibling position
    pub fn new(
        org_id: impl Into<String>,
        user_id: impl Into<String>,
        title: impl Into<String>,
        position: usize,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            org_id: org_id.into(),
            user_id: user_id.into(),
            title: title.into(),
            icon: DEFAULT_PAGE_ICON.to_string(),
            cover_image: None,
            parent_page_id: None,
            position,
            is_archived: false,
            is_favorite: false,
            created_at: now,
            updated_at: now,
            metadata: BTreeMap::new(),
        }
    }

    /// Stamp the update time
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Filters for listing pages
#[derive(Debug, Clone, Default)]
pub struct PageFilter {
    /// Restrict to children of this parent (`Some(None)` means root pages)
    pub parent_page_id: Option<Option<Uuid>>,

    /// Archived filter; `None` defaults to excluding archived pages
    pub is_archived: Option<bool>,

    pub is_favorite: Option<bool>,
}

impl PageFilter {
    /// Whether a page passes this filter. Archived pages are excluded
    /// unless the filter asks for them explicitly.
    pub fn matches(&self, page: &Page) -> bool {
        if let Some(parent) = &self.parent_page_id {
            if page.parent_page_id != *parent {
                return false;
            }
        }
        let archived = self.is_archived.unwrap_or(false);
        if page.is_archived != archived {
            return false;
        }
        if let Some(favorite) = self.is_favorite {
            if page.is_favorite != favorite {
                return false;
            }
        }
        true
    }
}
