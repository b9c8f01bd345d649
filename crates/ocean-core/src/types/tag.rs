//! Tag records
//!
//! Tags are tenant-scoped labels for blocks. `usage_count` mirrors the
//! number of blocks currently referencing the tag; the tag service owns
//! the bookkeeping (assignment +1, removal −1 floored at 0, deletion
//! cascades removal from all blocks).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tenant-scoped label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub org_id: String,

    /// Unique within the tenant
    pub name: String,

    pub color: Option<String>,
    pub description: Option<String>,

    /// Number of blocks currently referencing this tag
    pub usage_count: u64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tag {
    /// Build a new unused tag
    pub fn new(org_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            org_id: org_id.into(),
            name: name.into(),
            color: None,
            description: None,
            usage_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record one more assignment
    pub fn increment_usage(&mut self) {
        self.usage_count += 1;
        self.updated_at = Utc::now();
    }

    /// Record one removal; never goes below zero
    pub fn decrement_usage(&mut self) {
        self.usage_count = self.usage_count.saturating_sub(1);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_count_floors_at_zero() {
        let mut tag = Tag::new("org", "urgent");
        tag.decrement_usage();
        assert_eq!(tag.usage_count, 0);
        tag.increment_usage();
        tag.increment_usage();
        tag.decrement_usage();
        assert_eq!(tag.usage_count, 1);
    }
}
