//! Link records
//!
//! A link is a directed reference from a source block to a target block
//! or page. Block-to-block edges within a tenant must stay acyclic;
//! page targets are exempt from the cycle check (pages may reference
//! each other circularly by design).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{OceanError, Result};

/// What kind of entity a link points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkTarget {
    Block,
    Page,
}

/// Semantic flavor of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    Reference,
    Embed,
    Mention,
}

impl LinkType {
    /// Parse a link type from its wire name
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "reference" => Ok(Self::Reference),
            "embed" => Ok(Self::Embed),
            "mention" => Ok(Self::Mention),
            other => Err(OceanError::validation(format!("unknown link type: {other}"))),
        }
    }
}

/// A directed reference between workspace entities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub id: Uuid,
    pub org_id: String,
    pub source_block_id: Uuid,
    pub target_id: Uuid,
    pub target: LinkTarget,
    pub link_type: LinkType,
    pub created_at: DateTime<Utc>,
}

impl Link {
    /// Build a new link
    pub fn new(
        org_id: impl Into<String>,
        source_block_id: Uuid,
        target_id: Uuid,
        target: LinkTarget,
        link_type: LinkType,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            org_id: org_id.into(),
            source_block_id,
            target_id,
            target,
            link_type,
            created_at: Utc::now(),
        }
    }

    /// Whether this is a block-to-block edge (subject to the cycle check)
    pub fn is_block_edge(&self) -> bool {
        self.target == LinkTarget::Block
    }
}

/// A backlink enriched with source block preview data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Backlink {
    pub link_id: Uuid,
    pub link_type: LinkType,
    pub source_block_id: Uuid,
    pub source_page_id: Uuid,
    pub source_block_type: String,
    pub source_content_preview: String,
    pub created_at: DateTime<Utc>,
}
