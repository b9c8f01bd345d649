//! Search request and result types
//!
//! The search surface consumed by an upstream HTTP layer: a query with a
//! mode, optional metadata filters, and clamped limit/threshold
//! parameters. Results are transient and never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::block::Block;
use super::content::BlockType;
use crate::error::{OceanError, Result};

/// Documented limit range
pub const LIMIT_RANGE: (usize, usize) = (1, 100);

/// Default number of results
pub const DEFAULT_LIMIT: usize = 20;

/// Default similarity threshold
pub const DEFAULT_THRESHOLD: f32 = 0.7;

/// How to search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Pure vector similarity
    Semantic,
    /// Filter-only search with substring scoring, no embeddings
    Metadata,
    /// Vector similarity fused with metadata filters and re-ranking
    #[default]
    Hybrid,
}

impl SearchMode {
    /// Parse a mode from its wire name
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "semantic" => Ok(Self::Semantic),
            "metadata" => Ok(Self::Metadata),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(OceanError::validation(format!(
                "unknown search mode: {other}"
            ))),
        }
    }
}

/// Metadata filters applied to search candidates
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    /// Restrict to these block types (empty = all)
    pub block_types: Vec<BlockType>,

    /// Restrict to one page
    pub page_id: Option<Uuid>,

    /// Require all of these tags
    pub tag_ids: Vec<Uuid>,

    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

impl SearchFilters {
    /// Whether a block passes every filter
    pub fn matches(&self, block: &Block) -> bool {
        if !self.block_types.is_empty() && !self.block_types.contains(&block.block_type()) {
            return false;
        }
        if let Some(page_id) = self.page_id {
            if block.page_id != page_id {
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
        if let Some(from) = self.date_from {
            if block.created_at < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if block.created_at > to {
                return false;
            }
        }
        true
    }
}

/// A validated search request
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub org_id: String,
    pub mode: SearchMode,
    pub filters: SearchFilters,
    pub limit: usize,
    pub threshold: f32,
}

impl SearchRequest {
    /// Build a request with defaults (hybrid mode, limit 20,
    /// threshold 0.7) and validate it. The query must be non-empty;
    /// limit and threshold are clamped into their documented ranges.
    pub fn new(query: impl Into<String>, org_id: impl Into<String>) -> Result<Self> {
        Self::with_options(
            query,
            org_id,
            SearchMode::default(),
            SearchFilters::default(),
            DEFAULT_LIMIT,
            DEFAULT_THRESHOLD,
        )
    }

    /// Build a fully specified request and validate it
    pub fn with_options(
        query: impl Into<String>,
        org_id: impl Into<String>,
        mode: SearchMode,
        filters: SearchFilters,
        limit: usize,
        threshold: f32,
    ) -> Result<Self> {
        let query = query.into();
        if query.trim().is_empty() {
            return Err(OceanError::validation("search query must not be empty"));
        }
        let org_id = org_id.into();
        if org_id.is_empty() {
            return Err(OceanError::validation("org_id is required"));
        }
        Ok(Self {
            query,
            org_id,
            mode,
            filters,
            limit: limit.clamp(LIMIT_RANGE.0, LIMIT_RANGE.1),
            threshold: threshold.clamp(0.0, 1.0),
        })
    }
}

/// Whether a result came from vector similarity or metadata matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Semantic,
    Metadata,
}

/// A single search hit. Transient: assembled per request, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub block: Block,

    /// Raw similarity (semantic) or substring score (metadata), 0-1
    pub raw_score: f32,

    /// Fused score after ranking boosts, 0-1
    pub final_score: f32,

    pub match_type: MatchType,

    /// Query words (length ≥ 3) found in the block's searchable text
    pub highlights: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::content::BlockContent;

    #[test]
    fn empty_query_is_rejected() {
        assert!(matches!(
            SearchRequest::new("   ", "org"),
            Err(OceanError::Validation(_))
        ));
    }

    #[test]
    fn limit_and_threshold_are_clamped() {
        let req = SearchRequest::with_options(
            "q",
            "org",
            SearchMode::Hybrid,
            SearchFilters::default(),
            5000,
            1.7,
        )
        .unwrap();
        assert_eq!(req.limit, 100);
        assert_eq!(req.threshold, 1.0);

        let req = SearchRequest::with_options(
            "q",
            "org",
            SearchMode::Semantic,
            SearchFilters::default(),
            0,
            -0.5,
        )
        .unwrap();
        assert_eq!(req.limit, 1);
        assert_eq!(req.threshold, 0.0);
    }

    #[test]
    fn default_mode_is_hybrid() {
        let req = SearchRequest::new("query", "org").unwrap();
        assert_eq!(req.mode, SearchMode::Hybrid);
        assert_eq!(req.limit, DEFAULT_LIMIT);
        assert_eq!(req.threshold, DEFAULT_THRESHOLD);
    }

    #[test]
    fn filters_require_all_tags() {
        let mut block = Block::new(
            Uuid::new_v4(),
            "org",
            "user",
            BlockContent::Text { text: "x".into() },
            0,
        );
        let t1 = Uuid::new_v4();
        let t2 = Uuid::new_v4();
        block.properties.tag_ids.push(t1);

        let filter = SearchFilters {
            tag_ids: vec![t1, t2],
            ..Default::default()
        };
        assert!(!filter.matches(&block));

        block.properties.tag_ids.push(t2);
        assert!(filter.matches(&block));
    }
}
