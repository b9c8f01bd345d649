//! Block lifecycle and the position manager
//!
//! Owns the dense-position invariant: within one page, the positions of
//! all blocks are exactly `{0, 1, ..., n-1}`. Every block write for a
//! page runs under that page's async lock — position mutations (create,
//! batch create, move, delete) because they read the ordered siblings
//! and write the complete new assignment, and content/property updates
//! because store writes are whole-record: a write-back composed outside
//! the lock could restore a position a concurrent resequence just
//! changed.
//!
//! Embeddings follow the searchable text. A block gets a vector iff its
//! text is non-empty; the vector is regenerated when the text changes and
//! left alone when only non-text properties change. Embedding failure on
//! create/update is non-fatal: the block persists without a vector
//! reference and the degraded state is logged.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use ocean_core::{
    Block, BlockContent, BlockFilter, BlockProperties, BlockType, DocumentStore,
    EmbeddingProvider, OceanError, Result, VectorIndex, VectorMetadata,
};

use crate::locks::ScopeLocks;
use crate::preview;

/// Upper bound when reading a whole page for resequencing
const PAGE_SCAN_LIMIT: usize = 10_000;

/// Characters kept in the embedding-info text preview
const PREVIEW_CHARS: usize = 100;

/// Input for creating a block
#[derive(Debug, Clone)]
pub struct NewBlock {
    pub content: BlockContent,
    pub parent_block_id: Option<Uuid>,
    pub properties: BlockProperties,
}

impl NewBlock {
    pub fn new(content: BlockContent) -> Self {
        Self {
            content,
            parent_block_id: None,
            properties: BlockProperties::default(),
        }
    }
}

/// Partial update for a block; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct BlockPatch {
    pub content: Option<BlockContent>,
    pub properties: Option<BlockProperties>,
}

/// Embedding state of a block, for diagnostics
#[derive(Debug, Clone)]
pub struct BlockEmbeddingInfo {
    pub block_id: Uuid,
    pub has_embedding: bool,
    pub vector_id: Option<Uuid>,
    pub vector_dimensions: Option<usize>,
    pub model: String,
    pub text_preview: String,
}

/// Service for block CRUD, ordering, and embedding lifecycle
#[derive(Clone)]
pub struct BlockService {
    store: Arc<dyn DocumentStore>,
    vectors: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    page_locks: Arc<ScopeLocks>,
}

impl BlockService {
    /// `page_locks` must be the same registry shared with every other
    /// service that writes block records (see [`crate::OceanWorkspace`])
    pub fn new(
        store: Arc<dyn DocumentStore>,
        vectors: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        page_locks: Arc<ScopeLocks>,
    ) -> Self {
        Self {
            store,
            vectors,
            embedder,
            page_locks,
        }
    }

    /// Create a block at the end of its page
    pub async fn create_block(
        &self,
        org_id: &str,
        user_id: &str,
        page_id: Uuid,
        new: NewBlock,
    ) -> Result<Block> {
        self.require_page(org_id, page_id).await?;

        let lock = self.page_locks.lock_for(&page_id.to_string());
        let _guard = lock.lock().await;

        let position = self.store.count_blocks(org_id, page_id).await?;
        let mut block = Block::new(page_id, org_id, user_id, new.content, position);
        block.parent_block_id = new.parent_block_id;
        block.properties = new.properties;

        self.attach_embedding(&mut block).await;
        self.store.insert_block(block.clone()).await?;
        debug!(block_id = %block.id, page_id = %page_id, position, "created block");
        Ok(block)
    }

    /// Create several blocks at the end of a page, with one batch
    /// embedding round-trip for all non-empty texts
    pub async fn create_block_batch(
        &self,
        org_id: &str,
        user_id: &str,
        page_id: Uuid,
        batch: Vec<NewBlock>,
    ) -> Result<Vec<Block>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        self.require_page(org_id, page_id).await?;

        let lock = self.page_locks.lock_for(&page_id.to_string());
        let _guard = lock.lock().await;

        let start = self.store.count_blocks(org_id, page_id).await?;
        let mut blocks: Vec<Block> = batch
            .into_iter()
            .enumerate()
            .map(|(i, new)| {
                let mut block = Block::new(page_id, org_id, user_id, new.content, start + i);
                block.parent_block_id = new.parent_block_id;
                block.properties = new.properties;
                block
            })
            .collect();

        self.attach_embeddings_batch(&mut blocks).await;
        let count = blocks.len();
        self.store.insert_blocks(blocks.clone()).await?;
        debug!(page_id = %page_id, count, start, "created block batch");
        Ok(blocks)
    }

    /// Fetch a block within the caller's tenant
    pub async fn get_block(&self, org_id: &str, id: Uuid) -> Result<Block> {
        self.store
            .get_block(org_id, id)
            .await?
            .ok_or(OceanError::not_found("block", id))
    }

    /// List blocks; page-scoped listings come back in position order
    pub async fn list_blocks(
        &self,
        org_id: &str,
        filter: &BlockFilter,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<Block>, usize)> {
        self.store
            .list_blocks(org_id, filter, limit.max(1), offset)
            .await
    }

    /// Apply a partial update. A content change regenerates the
    /// embedding only when the searchable text actually changed; a
    /// properties-only patch never touches the vector.
    pub async fn update_block(&self, org_id: &str, id: Uuid, patch: BlockPatch) -> Result<Block> {
        let page_id = self.get_block(org_id, id).await?.page_id;
        let lock = self.page_locks.lock_for(&page_id.to_string());
        let _guard = lock.lock().await;

        // Re-read inside the guard: the whole-record write below must
        // carry the position a concurrent resequence may have assigned.
        let mut block = self.get_block(org_id, id).await?;

        let mut text_changed = false;
        if let Some(content) = patch.content {
            text_changed = content.searchable_text() != block.searchable_text();
            block.content = content;
        }
        if let Some(properties) = patch.properties {
            block.properties = properties;
        }

        if text_changed {
            self.refresh_embedding(&mut block).await;
        }
        block.touch();
        self.store.update_block(&block).await?;
        Ok(block)
    }

    /// Hard delete a block, clean up its vector, and close the position
    /// gap it leaves behind
    pub async fn delete_block(&self, org_id: &str, id: Uuid) -> Result<()> {
        let page_id = self.get_block(org_id, id).await?.page_id;

        let lock = self.page_locks.lock_for(&page_id.to_string());
        let _guard = lock.lock().await;

        let (siblings, _) = self
            .store
            .list_blocks(org_id, &BlockFilter::for_page(page_id), PAGE_SCAN_LIMIT, 0)
            .await?;
        let vector_id = siblings
            .iter()
            .find(|b| b.id == id)
            .and_then(|b| b.vector_id);

        let mut remaining: Vec<Block> =
            siblings.into_iter().filter(|b| b.id != id).collect();
        let resequenced = resequence(&mut remaining);

        if !self.store.delete_block(org_id, id).await? {
            // Lost a race with another delete of the same block.
            return Err(OceanError::not_found("block", id));
        }
        if let Some(vector_id) = vector_id {
            if let Err(err) = self.vectors.delete(org_id, vector_id).await {
                warn!(block_id = %id, %err, "vector cleanup failed for deleted block");
            }
        }
        if !resequenced.is_empty() {
            self.store.update_blocks(&resequenced).await?;
        }
        debug!(block_id = %id, page_id = %page_id, "deleted block");
        Ok(())
    }

    /// Move a block to a new position within its page. The target is
    /// clamped into `[0, count-1]`; moving to the current position is a
    /// no-op; blocks between the old and new position shift by one.
    pub async fn move_block(&self, org_id: &str, id: Uuid, new_position: usize) -> Result<Block> {
        let block = self.get_block(org_id, id).await?;

        let lock = self.page_locks.lock_for(&block.page_id.to_string());
        let _guard = lock.lock().await;

        let (siblings, _) = self
            .store
            .list_blocks(org_id, &BlockFilter::for_page(block.page_id), PAGE_SCAN_LIMIT, 0)
            .await?;
        let mut siblings = siblings;

        let current = siblings
            .iter()
            .position(|b| b.id == id)
            .ok_or(OceanError::not_found("block", id))?;
        let target = new_position.min(siblings.len().saturating_sub(1));
        if target == current {
            return Ok(siblings.swap_remove(current));
        }

        let moved = siblings.remove(current);
        siblings.insert(target, moved);
        let resequenced = resequence(&mut siblings);
        self.store.update_blocks(&resequenced).await?;

        debug!(block_id = %id, from = current, to = target, "moved block");
        siblings
            .into_iter()
            .find(|b| b.id == id)
            .ok_or(OceanError::not_found("block", id))
    }

    /// Convert a block to another type, preserving its text. The
    /// embedding is regenerated only when the conversion changed the
    /// searchable text (e.g. a link dropping its URL).
    pub async fn convert_block(
        &self,
        org_id: &str,
        id: Uuid,
        new_type: BlockType,
    ) -> Result<Block> {
        let page_id = self.get_block(org_id, id).await?.page_id;
        let lock = self.page_locks.lock_for(&page_id.to_string());
        let _guard = lock.lock().await;

        let mut block = self.get_block(org_id, id).await?;
        if block.block_type() == new_type {
            return Ok(block);
        }

        let old_text = block.searchable_text();
        block.content = block.content.convert_to(new_type);
        if block.searchable_text() != old_text {
            self.refresh_embedding(&mut block).await;
        }
        block.touch();
        self.store.update_block(&block).await?;
        debug!(block_id = %id, new_type = %new_type, "converted block");
        Ok(block)
    }

    /// Embedding diagnostics for a block
    pub async fn block_embedding_info(&self, org_id: &str, id: Uuid) -> Result<BlockEmbeddingInfo> {
        let block = self.get_block(org_id, id).await?;
        Ok(BlockEmbeddingInfo {
            block_id: block.id,
            has_embedding: block.vector_id.is_some(),
            vector_id: block.vector_id,
            vector_dimensions: block.vector_dimensions,
            model: self.embedder.model().to_string(),
            text_preview: preview(&block.searchable_text(), PREVIEW_CHARS),
        })
    }

    async fn require_page(&self, org_id: &str, page_id: Uuid) -> Result<()> {
        self.store
            .get_page(org_id, page_id)
            .await?
            .map(|_| ())
            .ok_or(OceanError::not_found("page", page_id))
    }

    /// Generate and store an embedding for the block's searchable text.
    /// Failures are logged, not propagated: search degrades, writes don't.
    async fn attach_embedding(&self, block: &mut Block) {
        let text = block.searchable_text();
        if text.trim().is_empty() {
            return;
        }
        match self.embedder.embed(&text).await {
            Ok(vector) => self.store_vector(block, vector).await,
            Err(err) => {
                warn!(block_id = %block.id, %err, "embedding failed; block stored without vector");
            }
        }
    }

    /// Batch variant of [`attach_embedding`] for block creation
    async fn attach_embeddings_batch(&self, blocks: &mut [Block]) {
        let indexed: Vec<(usize, String)> = blocks
            .iter()
            .enumerate()
            .filter_map(|(i, b)| {
                let text = b.searchable_text();
                (!text.trim().is_empty()).then_some((i, text))
            })
            .collect();
        if indexed.is_empty() {
            return;
        }

        let texts: Vec<String> = indexed.iter().map(|(_, t)| t.clone()).collect();
        let vectors = match self.embedder.embed_batch(&texts).await {
            Ok(vectors) if vectors.len() == texts.len() => vectors,
            Ok(vectors) => {
                warn!(
                    expected = texts.len(),
                    got = vectors.len(),
                    "batch embedding returned wrong count; blocks stored without vectors"
                );
                return;
            }
            Err(err) => {
                warn!(%err, "batch embedding failed; blocks stored without vectors");
                return;
            }
        };

        for ((i, _), vector) in indexed.into_iter().zip(vectors) {
            self.store_vector(&mut blocks[i], vector).await;
        }
    }

    /// Delete the previous vector (if any) and embed the current text
    async fn refresh_embedding(&self, block: &mut Block) {
        if let Some(vector_id) = block.vector_id.take() {
            block.vector_dimensions = None;
            if let Err(err) = self.vectors.delete(&block.org_id, vector_id).await {
                warn!(block_id = %block.id, %err, "failed to delete stale vector");
            }
        }
        self.attach_embedding(block).await;
    }

    async fn store_vector(&self, block: &mut Block, vector: Vec<f32>) {
        let vector_id = Uuid::new_v4();
        let metadata = VectorMetadata {
            block_id: block.id,
            page_id: block.page_id,
            block_type: block.block_type(),
        };
        match self
            .vectors
            .upsert(&block.org_id, vector_id, vector, metadata)
            .await
        {
            Ok(()) => {
                block.vector_id = Some(vector_id);
                block.vector_dimensions = Some(self.embedder.dimensions());
            }
            Err(err) => {
                warn!(block_id = %block.id, %err, "vector upsert failed; block stored without vector");
            }
        }
    }
}

/// Assign dense positions `0..n` in list order, returning the blocks
/// whose position actually changed
fn resequence(blocks: &mut [Block]) -> Vec<Block> {
    let mut changed = Vec::new();
    for (index, block) in blocks.iter_mut().enumerate() {
        if block.position != index {
            block.position = index;
            block.touch();
            changed.push(block.clone());
        }
    }
    changed
}
