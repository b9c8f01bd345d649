//! Search orchestration
//!
//! Three modes over the same request shape:
//! - semantic: embed the query, similarity search, order by raw score
//! - metadata: store scan with filters, earliest-substring scoring
//! - hybrid: similarity search with filter push-down, residual filters
//!   applied locally, then the [`RankingEngine`]
//!
//! Search is read-only and lock-free. Embedding and vector failures
//! surface as `Upstream` errors; unlike block writes, search never
//! degrades silently.

pub mod ranking;

use std::sync::Arc;

use tracing::debug;

use ocean_core::{
    Block, BlockFilter, DocumentStore, EmbeddingProvider, MatchType, Result, SearchMode,
    SearchRequest, SearchResult, VectorFilter, VectorIndex,
};

pub use ranking::RankingEngine;

use ranking::extract_highlights;

/// How many candidates to over-fetch from the vector index relative to
/// the requested limit, so residual filtering still fills the page
const CANDIDATE_MULTIPLIER: usize = 3;

/// Upper bound on the store scan backing metadata mode
const METADATA_SCAN_LIMIT: usize = 1_000;

/// Orchestrates the embedding provider, vector index, and document
/// store into one search call
#[derive(Clone)]
pub struct SearchService {
    store: Arc<dyn DocumentStore>,
    vectors: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    ranker: RankingEngine,
}

impl SearchService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        vectors: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            store,
            vectors,
            embedder,
            ranker: RankingEngine::new(),
        }
    }

    /// Run a validated search request
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        debug!(
            org_id = %request.org_id,
            mode = ?request.mode,
            limit = request.limit,
            "running search"
        );
        match request.mode {
            SearchMode::Semantic => self.semantic(request).await,
            SearchMode::Metadata => self.metadata(request).await,
            SearchMode::Hybrid => self.hybrid(request).await,
        }
    }

    /// Pure vector similarity, ordered by raw score
    async fn semantic(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        let candidates = self.vector_candidates(request).await?;
        let mut results: Vec<SearchResult> = candidates
            .into_iter()
            .map(|(block, score)| {
                let highlights = extract_highlights(&request.query, &block.searchable_text());
                SearchResult {
                    raw_score: score,
                    final_score: score,
                    match_type: MatchType::Semantic,
                    highlights,
                    block,
                }
            })
            .collect();
        results.truncate(request.limit);
        Ok(results)
    }

    /// Filter scan with earliest-substring scoring; no embeddings
    async fn metadata(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        let filter = BlockFilter {
            page_id: request.filters.page_id,
            block_types: request.filters.block_types.clone(),
            tag_ids: request.filters.tag_ids.clone(),
            created_after: request.filters.date_from,
            created_before: request.filters.date_to,
            parent_block_id: None,
        };
        let (blocks, _) = self
            .store
            .list_blocks(&request.org_id, &filter, METADATA_SCAN_LIMIT, 0)
            .await?;

        let needle = request.query.to_lowercase();
        let mut scored: Vec<(Block, f32)> = blocks
            .into_iter()
            .filter_map(|block| {
                let text = block.searchable_text().to_lowercase();
                if text.is_empty() {
                    return None;
                }
                let index = text.find(&needle)?;
                // Earlier matches score higher. The transform depends on
                // the match index alone so candidates with different
                // text lengths rank consistently.
                let score = 1.0 / (1.0 + index as f32);
                Some((block, score))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| b.0.created_at.cmp(&a.0.created_at))
        });
        scored.truncate(request.limit);

        Ok(scored
            .into_iter()
            .map(|(block, score)| {
                let highlights = extract_highlights(&request.query, &block.searchable_text());
                SearchResult {
                    raw_score: score,
                    final_score: score,
                    match_type: MatchType::Metadata,
                    highlights,
                    block,
                }
            })
            .collect())
    }

    /// Vector similarity with push-down filters, residual filtering,
    /// and re-ranking
    async fn hybrid(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        let candidates = self.vector_candidates(request).await?;
        let mut results = self.ranker.rank(candidates, &request.query);
        results.truncate(request.limit);
        Ok(results)
    }

    /// Shared semantic/hybrid front half: embed the query, search the
    /// tenant namespace with whatever filters the index can push down,
    /// resolve hits to blocks, and apply the residual filters locally.
    async fn vector_candidates(&self, request: &SearchRequest) -> Result<Vec<(Block, f32)>> {
        let query_vector = self.embedder.embed(&request.query).await?;

        let pushdown = VectorFilter {
            page_id: request.filters.page_id,
            block_type: match request.filters.block_types.as_slice() {
                [single] => Some(*single),
                _ => None,
            },
        };
        let top_k = request.limit.saturating_mul(CANDIDATE_MULTIPLIER);
        let hits = self
            .vectors
            .search(
                &request.org_id,
                &query_vector,
                &pushdown,
                top_k,
                request.threshold,
            )
            .await?;

        let mut candidates = Vec::with_capacity(hits.len());
        for hit in hits {
            // The index may briefly hold vectors for deleted blocks.
            let Some(block) = self
                .store
                .get_block(&request.org_id, hit.metadata.block_id)
                .await?
            else {
                debug!(vector_id = %hit.id, "skipping stale vector hit");
                continue;
            };
            if !request.filters.matches(&block) {
                continue;
            }
            candidates.push((block, hit.score));
        }
        Ok(candidates)
    }
}
