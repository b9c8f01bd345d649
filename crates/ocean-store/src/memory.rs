//! In-memory store backends
//!
//! Complete implementations of [`DocumentStore`] and [`VectorIndex`] on
//! plain maps behind an async `RwLock`. Used by the test suites and by
//! local mode; unlike the remote backend these guarantee read-after-write
//! consistency through a single handle.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use ocean_core::traits::embedding::cosine_similarity;
use ocean_core::traits::store::{BlockFilter, DocumentStore, LinkFilter};
use ocean_core::traits::vector::{VectorFilter, VectorHit, VectorIndex, VectorMetadata};
use ocean_core::types::{Block, Link, Page, PageFilter, Tag};
use ocean_core::Result;

type Key = (String, Uuid);

#[derive(Default)]
struct Tables {
    pages: HashMap<Key, Page>,
    blocks: HashMap<Key, Block>,
    links: HashMap<Key, Link>,
    tags: HashMap<Key, Tag>,
}

/// In-memory document store
#[derive(Default, Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

fn key(org_id: &str, id: Uuid) -> Key {
    (org_id.to_string(), id)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_page(&self, page: Page) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.pages.insert(key(&page.org_id, page.id), page);
        Ok(())
    }

    async fn get_page(&self, org_id: &str, id: Uuid) -> Result<Option<Page>> {
        let tables = self.tables.read().await;
        Ok(tables.pages.get(&key(org_id, id)).cloned())
    }

    async fn list_pages(
        &self,
        org_id: &str,
        filter: &PageFilter,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<Page>, usize)> {
        let tables = self.tables.read().await;
        let mut pages: Vec<Page> = tables
            .pages
            .values()
            .filter(|p| p.org_id == org_id && filter.matches(p))
            .cloned()
            .collect();
        pages.sort_by(|a, b| {
            a.parent_page_id
                .cmp(&b.parent_page_id)
                .then(a.position.cmp(&b.position))
        });
        let total = pages.len();
        let rows = pages.into_iter().skip(offset).take(limit).collect();
        Ok((rows, total))
    }

    async fn update_page(&self, page: &Page) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .pages
            .insert(key(&page.org_id, page.id), page.clone());
        Ok(())
    }

    async fn insert_block(&self, block: Block) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.blocks.insert(key(&block.org_id, block.id), block);
        Ok(())
    }

    async fn insert_blocks(&self, blocks: Vec<Block>) -> Result<()> {
        let mut tables = self.tables.write().await;
        for block in blocks {
            tables.blocks.insert(key(&block.org_id, block.id), block);
        }
        Ok(())
    }

    async fn get_block(&self, org_id: &str, id: Uuid) -> Result<Option<Block>> {
        let tables = self.tables.read().await;
        Ok(tables.blocks.get(&key(org_id, id)).cloned())
    }

    async fn list_blocks(
        &self,
        org_id: &str,
        filter: &BlockFilter,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<Block>, usize)> {
        let tables = self.tables.read().await;
        let mut blocks: Vec<Block> = tables
            .blocks
            .values()
            .filter(|b| b.org_id == org_id && filter.matches(b))
            .cloned()
            .collect();
        if filter.page_id.is_some() {
            blocks.sort_by_key(|b| b.position);
        } else {
            blocks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        let total = blocks.len();
        let rows = blocks.into_iter().skip(offset).take(limit).collect();
        Ok((rows, total))
    }

    async fn update_block(&self, block: &Block) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .blocks
            .insert(key(&block.org_id, block.id), block.clone());
        Ok(())
    }

    async fn update_blocks(&self, blocks: &[Block]) -> Result<()> {
        let mut tables = self.tables.write().await;
        for block in blocks {
            tables
                .blocks
                .insert(key(&block.org_id, block.id), block.clone());
        }
        Ok(())
    }

    async fn delete_block(&self, org_id: &str, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.blocks.remove(&key(org_id, id)).is_some())
    }

    async fn count_blocks(&self, org_id: &str, page_id: Uuid) -> Result<usize> {
        let tables = self.tables.read().await;
        Ok(tables
            .blocks
            .values()
            .filter(|b| b.org_id == org_id && b.page_id == page_id)
            .count())
    }

    async fn insert_link(&self, link: Link) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.links.insert(key(&link.org_id, link.id), link);
        Ok(())
    }

    async fn get_link(&self, org_id: &str, id: Uuid) -> Result<Option<Link>> {
        let tables = self.tables.read().await;
        Ok(tables.links.get(&key(org_id, id)).cloned())
    }

    async fn list_links(&self, org_id: &str, filter: &LinkFilter) -> Result<Vec<Link>> {
        let tables = self.tables.read().await;
        let mut links: Vec<Link> = tables
            .links
            .values()
            .filter(|l| l.org_id == org_id && filter.matches(l))
            .cloned()
            .collect();
        links.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(links)
    }

    async fn delete_link(&self, org_id: &str, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.links.remove(&key(org_id, id)).is_some())
    }

    async fn insert_tag(&self, tag: Tag) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.tags.insert(key(&tag.org_id, tag.id), tag);
        Ok(())
    }

    async fn get_tag(&self, org_id: &str, id: Uuid) -> Result<Option<Tag>> {
        let tables = self.tables.read().await;
        Ok(tables.tags.get(&key(org_id, id)).cloned())
    }

    async fn list_tags(&self, org_id: &str) -> Result<Vec<Tag>> {
        let tables = self.tables.read().await;
        let mut tags: Vec<Tag> = tables
            .tags
            .values()
            .filter(|t| t.org_id == org_id)
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn update_tag(&self, tag: &Tag) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.tags.insert(key(&tag.org_id, tag.id), tag.clone());
        Ok(())
    }

    async fn delete_tag(&self, org_id: &str, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.tags.remove(&key(org_id, id)).is_some())
    }
}

struct StoredVector {
    vector: Vec<f32>,
    metadata: VectorMetadata,
}

/// In-memory vector index with exact cosine similarity
#[derive(Default, Clone)]
pub struct MemoryVectorIndex {
    namespaces: Arc<RwLock<HashMap<String, HashMap<Uuid, StoredVector>>>>,
}

impl MemoryVectorIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vectors stored in a namespace (test helper)
    pub async fn len(&self, namespace: &str) -> usize {
        let namespaces = self.namespaces.read().await;
        namespaces.get(namespace).map_or(0, HashMap::len)
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn upsert(
        &self,
        namespace: &str,
        id: Uuid,
        vector: Vec<f32>,
        metadata: VectorMetadata,
    ) -> Result<()> {
        let mut namespaces = self.namespaces.write().await;
        namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(id, StoredVector { vector, metadata });
        Ok(())
    }

    async fn delete(&self, namespace: &str, id: Uuid) -> Result<()> {
        let mut namespaces = self.namespaces.write().await;
        if let Some(ns) = namespaces.get_mut(namespace) {
            ns.remove(&id);
        }
        Ok(())
    }

    async fn search(
        &self,
        namespace: &str,
        query: &[f32],
        filter: &VectorFilter,
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<VectorHit>> {
        let namespaces = self.namespaces.read().await;
        let Some(ns) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<VectorHit> = ns
            .iter()
            .filter(|(_, stored)| filter.matches(&stored.metadata))
            .map(|(id, stored)| VectorHit {
                id: *id,
                score: cosine_similarity(query, &stored.vector),
                metadata: stored.metadata.clone(),
            })
            .filter(|hit| hit.score >= min_score)
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocean_core::types::{BlockContent, BlockType};

    fn block(org: &str, page: Uuid, text: &str, position: usize) -> Block {
        Block::new(page, org, "user", BlockContent::Text { text: text.into() }, position)
    }

    #[tokio::test]
    async fn tenant_scoping_hides_other_orgs() {
        let store = MemoryStore::new();
        let page = Uuid::new_v4();
        let b = block("org-a", page, "hello", 0);
        let id = b.id;
        store.insert_block(b).await.unwrap();

        assert!(store.get_block("org-a", id).await.unwrap().is_some());
        assert!(store.get_block("org-b", id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn page_scoped_listing_is_position_ordered() {
        let store = MemoryStore::new();
        let page = Uuid::new_v4();
        for position in [2usize, 0, 1] {
            store
                .insert_block(block("org", page, &format!("b{position}"), position))
                .await
                .unwrap();
        }

        let (rows, total) = store
            .list_blocks("org", &BlockFilter::for_page(page), 100, 0)
            .await
            .unwrap();
        assert_eq!(total, 3);
        let positions: Vec<usize> = rows.iter().map(|b| b.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn list_blocks_total_ignores_pagination() {
        let store = MemoryStore::new();
        let page = Uuid::new_v4();
        for i in 0..5 {
            store
                .insert_block(block("org", page, "text", i))
                .await
                .unwrap();
        }
        let (rows, total) = store
            .list_blocks("org", &BlockFilter::for_page(page), 2, 1)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn vector_search_filters_and_ranks() {
        let index = MemoryVectorIndex::new();
        let page_a = Uuid::new_v4();
        let page_b = Uuid::new_v4();

        let meta = |page_id| VectorMetadata {
            block_id: Uuid::new_v4(),
            page_id,
            block_type: BlockType::Text,
        };

        index
            .upsert("org", Uuid::new_v4(), vec![1.0, 0.0], meta(page_a))
            .await
            .unwrap();
        index
            .upsert("org", Uuid::new_v4(), vec![0.9, 0.1], meta(page_a))
            .await
            .unwrap();
        index
            .upsert("org", Uuid::new_v4(), vec![1.0, 0.0], meta(page_b))
            .await
            .unwrap();

        let filter = VectorFilter {
            page_id: Some(page_a),
            block_type: None,
        };
        let hits = index
            .search("org", &[1.0, 0.0], &filter, 10, 0.0)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].score >= hits[1].score);

        let other_ns = index
            .search("elsewhere", &[1.0, 0.0], &VectorFilter::default(), 10, 0.0)
            .await
            .unwrap();
        assert!(other_ns.is_empty());
    }

    #[tokio::test]
    async fn vector_delete_is_idempotent() {
        let index = MemoryVectorIndex::new();
        let id = Uuid::new_v4();
        index
            .upsert(
                "org",
                id,
                vec![1.0],
                VectorMetadata {
                    block_id: Uuid::new_v4(),
                    page_id: Uuid::new_v4(),
                    block_type: BlockType::Text,
                },
            )
            .await
            .unwrap();
        index.delete("org", id).await.unwrap();
        index.delete("org", id).await.unwrap();
        assert_eq!(index.len("org").await, 0);
    }
}
