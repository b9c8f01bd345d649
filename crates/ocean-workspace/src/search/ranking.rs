//! Result ranking
//!
//! Hybrid search candidates go through one deterministic pipeline:
//! deduplicate by block id keeping the best raw score, add boosts, cap
//! at 1.0, sort. Ranking is pure computation and never errors.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use ocean_core::{Block, BlockType, MatchType, SearchResult};

/// Boost for a verbatim (case-insensitive) query match in the text
const EXACT_MATCH_BOOST: f32 = 0.10;

/// Boost for heading blocks
const HEADING_BOOST: f32 = 0.03;

/// Freshness boosts by age of last update
const FRESHNESS_WEEK: f32 = 0.05;
const FRESHNESS_MONTH: f32 = 0.03;
const FRESHNESS_QUARTER: f32 = 0.01;

/// Minimum query word length to count as a highlight
const MIN_HIGHLIGHT_LEN: usize = 3;

/// Deterministic re-ranker for search candidates
#[derive(Debug, Clone, Copy, Default)]
pub struct RankingEngine;

impl RankingEngine {
    pub fn new() -> Self {
        Self
    }

    /// Rank `(block, raw_score)` candidates: dedup by block id keeping
    /// the maximum raw score, apply boosts, sort by final score
    /// descending with newest-created blocks first on ties.
    pub fn rank(&self, candidates: Vec<(Block, f32)>, query: &str) -> Vec<SearchResult> {
        let mut best: HashMap<Uuid, (Block, f32)> = HashMap::new();
        for (block, score) in candidates {
            match best.entry(block.id) {
                Entry::Occupied(mut entry) => {
                    if score > entry.get().1 {
                        entry.get_mut().1 = score;
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert((block, score));
                }
            }
        }

        let now = Utc::now();
        let needle = query.to_lowercase();
        let mut results: Vec<SearchResult> = best
            .into_values()
            .map(|(block, raw_score)| {
                let text = block.searchable_text();
                let mut boost = 0.0;
                if !needle.is_empty() && text.to_lowercase().contains(&needle) {
                    boost += EXACT_MATCH_BOOST;
                }
                boost += freshness_boost(now, block.updated_at);
                if block.block_type() == BlockType::Heading {
                    boost += HEADING_BOOST;
                }

                let highlights = extract_highlights(query, &text);
                SearchResult {
                    final_score: (raw_score + boost).min(1.0),
                    raw_score,
                    match_type: MatchType::Semantic,
                    highlights,
                    block,
                }
            })
            .collect();

        results.sort_by(|a, b| {
            b.final_score
                .total_cmp(&a.final_score)
                .then_with(|| b.block.created_at.cmp(&a.block.created_at))
        });
        results
    }
}

fn freshness_boost(now: DateTime<Utc>, updated_at: DateTime<Utc>) -> f32 {
    let age = now.signed_duration_since(updated_at);
    if age < Duration::days(7) {
        FRESHNESS_WEEK
    } else if age < Duration::days(30) {
        FRESHNESS_MONTH
    } else if age < Duration::days(90) {
        FRESHNESS_QUARTER
    } else {
        0.0
    }
}

/// Query words (length ≥ 3, case-insensitive) found in the text,
/// deduplicated in query order
pub fn extract_highlights(query: &str, text: &str) -> Vec<String> {
    let haystack = text.to_lowercase();
    let mut highlights: Vec<String> = Vec::new();
    for word in query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_HIGHLIGHT_LEN)
    {
        if haystack.contains(word) && !highlights.iter().any(|h| h == word) {
            highlights.push(word.to_string());
        }
    }
    highlights
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocean_core::BlockContent;

    fn text_block(text: &str) -> Block {
        Block::new(
            Uuid::new_v4(),
            "org",
            "user",
            BlockContent::Text { text: text.into() },
            0,
        )
    }

    #[test]
    fn dedup_keeps_best_raw_score() {
        let block = text_block("duplicate candidate");
        let results = RankingEngine::new().rank(
            vec![(block.clone(), 0.4), (block.clone(), 0.8), (block, 0.6)],
            "nomatch",
        );
        assert_eq!(results.len(), 1);
        assert!((results[0].raw_score - 0.8).abs() < 1e-6);
    }

    #[test]
    fn exact_match_and_heading_boosts_apply() {
        let heading = Block::new(
            Uuid::new_v4(),
            "org",
            "user",
            BlockContent::Heading {
                text: "Quarterly Roadmap".into(),
                level: 1,
            },
            0,
        );
        let results = RankingEngine::new().rank(vec![(heading, 0.5)], "roadmap");
        // fresh block: 0.5 + 0.10 exact + 0.03 heading + 0.05 freshness
        assert!((results[0].final_score - 0.68).abs() < 1e-6);
    }

    #[test]
    fn final_score_is_capped_at_one() {
        let block = text_block("the query text itself");
        let results = RankingEngine::new().rank(vec![(block, 0.99)], "query text");
        assert!(results[0].final_score <= 1.0);
    }

    #[test]
    fn stale_blocks_get_no_freshness_boost() {
        let mut block = text_block("old note");
        block.updated_at = Utc::now() - Duration::days(200);
        block.created_at = block.updated_at;
        let results = RankingEngine::new().rank(vec![(block, 0.5)], "unrelated");
        assert!((results[0].final_score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn ties_break_toward_newer_blocks() {
        let mut old = text_block("same");
        old.created_at = Utc::now() - Duration::days(400);
        old.updated_at = old.created_at;
        let mut newer = text_block("same");
        newer.created_at = Utc::now() - Duration::days(100);
        newer.updated_at = newer.created_at;

        let results = RankingEngine::new().rank(vec![(old.clone(), 0.5), (newer.clone(), 0.5)], "x");
        assert_eq!(results[0].block.id, newer.id);
        assert_eq!(results[1].block.id, old.id);
    }

    #[test]
    fn highlights_skip_short_and_absent_words() {
        let highlights = extract_highlights("an api for search api", "the search api docs");
        assert_eq!(highlights, vec!["api".to_string(), "search".to_string()]);
    }

    #[test]
    fn highlights_are_case_insensitive() {
        let highlights = extract_highlights("ROADMAP", "quarterly roadmap review");
        assert_eq!(highlights, vec!["roadmap".to_string()]);
    }
}
