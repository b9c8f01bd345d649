//! Integration tests for the search orchestrator and the block
//! embedding lifecycle, over the in-memory backends and the mock
//! embedder.

use std::sync::Arc;

use uuid::Uuid;

use ocean_core::{
    Block, BlockContent, BlockProperties, BlockType, MatchType, OceanError, Page,
    SearchFilters, SearchMode, SearchRequest,
};
use ocean_embeddings::MockEmbeddingProvider;
use ocean_store::{MemoryStore, MemoryVectorIndex};
use ocean_workspace::{BlockPatch, NewBlock, NewPage, OceanWorkspace};

const ORG: &str = "org-test";
const USER: &str = "user-test";

fn workspace() -> (OceanWorkspace, Arc<MemoryVectorIndex>) {
    let vectors = Arc::new(MemoryVectorIndex::new());
    let ws = OceanWorkspace::new(
        Arc::new(MemoryStore::new()),
        vectors.clone(),
        Arc::new(MockEmbeddingProvider::new(64)),
    );
    (ws, vectors)
}

async fn make_page(ws: &OceanWorkspace) -> Page {
    ws.pages
        .create_page(ORG, USER, NewPage::titled("Search Corpus"))
        .await
        .unwrap()
}

async fn make_block(ws: &OceanWorkspace, page_id: Uuid, content: BlockContent) -> Block {
    ws.blocks
        .create_block(ORG, USER, page_id, NewBlock::new(content))
        .await
        .unwrap()
}

fn text(text: &str) -> BlockContent {
    BlockContent::Text { text: text.into() }
}

fn request(query: &str, mode: SearchMode) -> SearchRequest {
    SearchRequest::with_options(query, ORG, mode, SearchFilters::default(), 20, 0.0).unwrap()
}

// --- search modes ---

#[tokio::test]
async fn hybrid_results_are_bounded_ordered_and_unique() {
    let (ws, _) = workspace();
    let page = make_page(&ws).await;
    for content in [
        "machine learning fundamentals",
        "notes on machine learning models",
        "deep learning and transformers",
        "grocery list apples bananas",
    ] {
        make_block(&ws, page.id, text(content)).await;
    }

    let results = ws
        .search
        .search(&request("machine learning", SearchMode::Hybrid))
        .await
        .unwrap();
    assert!(!results.is_empty());

    let mut seen = std::collections::HashSet::new();
    for result in &results {
        assert!((0.0..=1.0).contains(&result.raw_score));
        assert!((0.0..=1.0).contains(&result.final_score));
        assert!(seen.insert(result.block.id), "duplicate block in results");
    }
    for pair in results.windows(2) {
        assert!(pair[0].final_score >= pair[1].final_score);
    }
}

#[tokio::test]
async fn semantic_mode_orders_by_raw_similarity() {
    let (ws, _) = workspace();
    let page = make_page(&ws).await;
    let relevant = make_block(&ws, page.id, text("machine learning notes")).await;
    make_block(&ws, page.id, text("completely unrelated grocery run")).await;

    let results = ws
        .search
        .search(&request("machine learning", SearchMode::Semantic))
        .await
        .unwrap();

    assert_eq!(results[0].block.id, relevant.id);
    assert_eq!(results[0].match_type, MatchType::Semantic);
    assert_eq!(results[0].raw_score, results[0].final_score);
    for pair in results.windows(2) {
        assert!(pair[0].raw_score >= pair[1].raw_score);
    }
}

#[tokio::test]
async fn metadata_mode_ranks_earlier_matches_higher() {
    let (ws, _) = workspace();
    let page = make_page(&ws).await;
    let early = make_block(&ws, page.id, text("alpha release checklist")).await;
    let late = make_block(&ws, page.id, text("checklist for the alpha")).await;
    make_block(&ws, page.id, text("nothing to see here")).await;

    let results = ws
        .search
        .search(&request("alpha", SearchMode::Metadata))
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].block.id, early.id);
    assert_eq!(results[1].block.id, late.id);
    assert!(results[0].raw_score > results[1].raw_score);
    assert!(results.iter().all(|r| r.match_type == MatchType::Metadata));
}

#[tokio::test]
async fn metadata_scoring_is_independent_of_text_length() {
    let (ws, _) = workspace();
    let page = make_page(&ws).await;

    // Earlier match in a short text must outrank a later match in a
    // much longer text.
    let early_short = make_block(&ws, page.id, text("a zeta")).await;
    let long_text = format!("long zeta {}", "filler words about other topics ".repeat(4));
    let late_long = make_block(&ws, page.id, text(&long_text)).await;

    let results = ws
        .search
        .search(&request("zeta", SearchMode::Metadata))
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].block.id, early_short.id);
    assert_eq!(results[1].block.id, late_long.id);
    assert!(results[0].raw_score > results[1].raw_score);
}

#[tokio::test]
async fn hybrid_applies_residual_filters_locally() {
    let (ws, _) = workspace();
    let page = make_page(&ws).await;
    let other_page = ws
        .pages
        .create_page(ORG, USER, NewPage::titled("Other"))
        .await
        .unwrap();

    let on_page = make_block(&ws, page.id, text("shared phrase here")).await;
    make_block(&ws, other_page.id, text("shared phrase here too")).await;

    let filters = SearchFilters {
        page_id: Some(page.id),
        ..Default::default()
    };
    let req =
        SearchRequest::with_options("shared phrase", ORG, SearchMode::Hybrid, filters, 20, 0.0)
            .unwrap();
    let results = ws.search.search(&req).await.unwrap();

    assert!(!results.is_empty());
    assert!(results.iter().all(|r| r.block.id == on_page.id));
}

#[tokio::test]
async fn block_type_filter_restricts_results() {
    let (ws, _) = workspace();
    let page = make_page(&ws).await;
    make_block(&ws, page.id, text("release planning")).await;
    let heading = make_block(
        &ws,
        page.id,
        BlockContent::Heading {
            text: "release planning".into(),
            level: 1,
        },
    )
    .await;

    let filters = SearchFilters {
        block_types: vec![BlockType::Heading],
        ..Default::default()
    };
    let req = SearchRequest::with_options(
        "release planning",
        ORG,
        SearchMode::Hybrid,
        filters,
        20,
        0.0,
    )
    .unwrap();
    let results = ws.search.search(&req).await.unwrap();

    assert!(!results.is_empty());
    assert!(results.iter().all(|r| r.block.id == heading.id));
}

#[tokio::test]
async fn highlights_contain_matched_query_words() {
    let (ws, _) = workspace();
    let page = make_page(&ws).await;
    make_block(&ws, page.id, text("machine learning in production")).await;

    let results = ws
        .search
        .search(&request("Machine Learning", SearchMode::Hybrid))
        .await
        .unwrap();
    assert!(results[0].highlights.contains(&"machine".to_string()));
    assert!(results[0].highlights.contains(&"learning".to_string()));
}

#[tokio::test]
async fn search_is_tenant_scoped() {
    let (ws, _) = workspace();
    let page = make_page(&ws).await;
    make_block(&ws, page.id, text("secret roadmap")).await;

    let req = SearchRequest::with_options(
        "secret roadmap",
        "some-other-org",
        SearchMode::Hybrid,
        SearchFilters::default(),
        20,
        0.0,
    )
    .unwrap();
    assert!(ws.search.search(&req).await.unwrap().is_empty());
}

#[tokio::test]
async fn search_surfaces_embedding_failure_as_upstream() {
    // Zero-dimension mock fails every embed call.
    let ws = OceanWorkspace::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryVectorIndex::new()),
        Arc::new(MockEmbeddingProvider::new(0)),
    );
    let err = ws
        .search
        .search(&request("anything", SearchMode::Hybrid))
        .await
        .unwrap_err();
    assert!(matches!(err, OceanError::Upstream(_)));
    assert!(err.is_retryable());
}

// --- embedding lifecycle ---

#[tokio::test]
async fn nonempty_text_gets_a_vector() {
    let (ws, vectors) = workspace();
    let page = make_page(&ws).await;
    let block = make_block(&ws, page.id, text("some content")).await;

    assert!(block.vector_id.is_some());
    assert_eq!(block.vector_dimensions, Some(64));
    assert_eq!(vectors.len(ORG).await, 1);
}

#[tokio::test]
async fn empty_text_gets_no_vector() {
    let (ws, vectors) = workspace();
    let page = make_page(&ws).await;
    let block = make_block(&ws, page.id, text("")).await;

    assert!(block.vector_id.is_none());
    assert!(block.vector_dimensions.is_none());
    assert_eq!(vectors.len(ORG).await, 0);
}

#[tokio::test]
async fn text_change_regenerates_the_vector() {
    let (ws, vectors) = workspace();
    let page = make_page(&ws).await;
    let block = make_block(&ws, page.id, text("before")).await;
    let old_vector = block.vector_id;

    let updated = ws
        .blocks
        .update_block(
            ORG,
            block.id,
            BlockPatch {
                content: Some(text("after")),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(updated.vector_id.is_some());
    assert_ne!(updated.vector_id, old_vector);
    // Old vector is gone, not orphaned.
    assert_eq!(vectors.len(ORG).await, 1);
}

#[tokio::test]
async fn property_only_update_keeps_the_vector() {
    let (ws, _) = workspace();
    let page = make_page(&ws).await;
    let block = make_block(&ws, page.id, text("stable text")).await;

    let mut properties = BlockProperties::default();
    properties
        .extra
        .insert("color".into(), serde_json::json!("blue"));
    let updated = ws
        .blocks
        .update_block(
            ORG,
            block.id,
            BlockPatch {
                properties: Some(properties),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.vector_id, block.vector_id);
}

#[tokio::test]
async fn identical_text_update_keeps_the_vector() {
    let (ws, _) = workspace();
    let page = make_page(&ws).await;
    let block = make_block(&ws, page.id, text("same words")).await;

    let updated = ws
        .blocks
        .update_block(
            ORG,
            block.id,
            BlockPatch {
                content: Some(text("same words")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.vector_id, block.vector_id);
}

#[tokio::test]
async fn conversion_keeps_vector_when_text_is_unchanged() {
    let (ws, _) = workspace();
    let page = make_page(&ws).await;
    let block = make_block(&ws, page.id, text("section title")).await;

    let converted = ws
        .blocks
        .convert_block(ORG, block.id, BlockType::Heading)
        .await
        .unwrap();
    assert_eq!(converted.block_type(), BlockType::Heading);
    assert_eq!(converted.vector_id, block.vector_id);
}

#[tokio::test]
async fn conversion_regenerates_vector_when_text_changes() {
    let (ws, _) = workspace();
    let page = make_page(&ws).await;
    let block = make_block(
        &ws,
        page.id,
        BlockContent::Link {
            text: "docs".into(),
            url: "https://example.com".into(),
        },
    )
    .await;

    // Converting a link drops the URL from the searchable text.
    let converted = ws
        .blocks
        .convert_block(ORG, block.id, BlockType::Text)
        .await
        .unwrap();
    assert_eq!(converted.content, text("docs"));
    assert_ne!(converted.vector_id, block.vector_id);
}

#[tokio::test]
async fn delete_block_cleans_up_its_vector() {
    let (ws, vectors) = workspace();
    let page = make_page(&ws).await;
    let block = make_block(&ws, page.id, text("short lived")).await;
    assert_eq!(vectors.len(ORG).await, 1);

    ws.blocks.delete_block(ORG, block.id).await.unwrap();
    assert_eq!(vectors.len(ORG).await, 0);
}

#[tokio::test]
async fn embedding_failure_is_nonfatal_for_writes() {
    let ws = OceanWorkspace::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryVectorIndex::new()),
        Arc::new(MockEmbeddingProvider::new(0)),
    );
    let page = ws
        .pages
        .create_page(ORG, USER, NewPage::titled("Degraded"))
        .await
        .unwrap();

    let block = ws
        .blocks
        .create_block(ORG, USER, page.id, NewBlock::new(text("still persists")))
        .await
        .unwrap();
    assert!(block.vector_id.is_none());
    // The block is durably stored despite the failed embedding.
    let fetched = ws.blocks.get_block(ORG, block.id).await.unwrap();
    assert_eq!(fetched.searchable_text(), "still persists");
}

#[tokio::test]
async fn embedding_info_reports_model_and_preview() {
    let (ws, _) = workspace();
    let page = make_page(&ws).await;
    let long_text = "word ".repeat(50);
    let block = make_block(&ws, page.id, text(long_text.trim())).await;

    let info = ws.blocks.block_embedding_info(ORG, block.id).await.unwrap();
    assert!(info.has_embedding);
    assert_eq!(info.vector_id, block.vector_id);
    assert_eq!(info.vector_dimensions, Some(64));
    assert_eq!(info.model, "mock-bag-of-words");
    assert!(info.text_preview.ends_with("..."));
    assert!(info.text_preview.chars().count() <= 103);
}
