//! Link creation and graph integrity
//!
//! Block-to-block edges within a tenant must stay acyclic; page targets
//! are exempt and insert unconditionally (pages referencing each other
//! in a loop is normal). The cycle check asks whether the target can
//! already reach the source over the tenant's current block edges; the
//! check and the insert run under one per-tenant lock so two concurrent
//! creates cannot sneak a cycle past each other.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use ocean_core::{
    Backlink, DocumentStore, Link, LinkFilter, LinkTarget, LinkType, OceanError, Result,
};

use crate::locks::ScopeLocks;
use crate::preview;

/// Characters kept in backlink source previews
const PREVIEW_CHARS: usize = 100;

/// Service for links and backlinks
#[derive(Clone)]
pub struct LinkService {
    store: Arc<dyn DocumentStore>,
    org_locks: Arc<ScopeLocks>,
}

impl LinkService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            org_locks: Arc::new(ScopeLocks::new()),
        }
    }

    /// Create a link from a block to a block or page.
    ///
    /// Both endpoints must exist in the caller's tenant. A block target
    /// that can already reach the source is rejected with
    /// [`OceanError::CircularReference`] carrying the path that would
    /// close the cycle.
    pub async fn create_link(
        &self,
        org_id: &str,
        source_block_id: Uuid,
        target_id: Uuid,
        target: LinkTarget,
        link_type: LinkType,
    ) -> Result<Link> {
        self.store
            .get_block(org_id, source_block_id)
            .await?
            .ok_or(OceanError::not_found("block", source_block_id))?;

        match target {
            LinkTarget::Page => {
                self.store
                    .get_page(org_id, target_id)
                    .await?
                    .ok_or(OceanError::not_found("page", target_id))?;

                let link = Link::new(org_id, source_block_id, target_id, target, link_type);
                self.store.insert_link(link.clone()).await?;
                debug!(link_id = %link.id, source = %source_block_id, page = %target_id, "created page link");
                Ok(link)
            }
            LinkTarget::Block => {
                let lock = self.org_locks.lock_for(org_id);
                let _guard = lock.lock().await;

                self.store
                    .get_block(org_id, target_id)
                    .await?
                    .ok_or(OceanError::not_found("block", target_id))?;

                let edges = self.block_edges(org_id).await?;
                if let Some(mut path) = shortest_path(&edges, target_id, source_block_id) {
                    // Close the loop in the reported path: the rejected
                    // edge source -> target completes the cycle.
                    path.push(target_id);
                    return Err(OceanError::CircularReference { path });
                }

                let link = Link::new(org_id, source_block_id, target_id, target, link_type);
                self.store.insert_link(link.clone()).await?;
                debug!(link_id = %link.id, source = %source_block_id, block = %target_id, "created block link");
                Ok(link)
            }
        }
    }

    /// Fetch a link within the caller's tenant
    pub async fn get_link(&self, org_id: &str, id: Uuid) -> Result<Link> {
        self.store
            .get_link(org_id, id)
            .await?
            .ok_or(OceanError::not_found("link", id))
    }

    /// Tenant-checked hard delete
    pub async fn delete_link(&self, org_id: &str, id: Uuid) -> Result<()> {
        if !self.store.delete_link(org_id, id).await? {
            return Err(OceanError::not_found("link", id));
        }
        debug!(link_id = %id, "deleted link");
        Ok(())
    }

    /// Links targeting a page, enriched with source block previews
    pub async fn page_backlinks(&self, org_id: &str, page_id: Uuid) -> Result<Vec<Backlink>> {
        self.store
            .get_page(org_id, page_id)
            .await?
            .ok_or(OceanError::not_found("page", page_id))?;
        self.backlinks(org_id, page_id, LinkTarget::Page).await
    }

    /// Links targeting a block, enriched with source block previews
    pub async fn block_backlinks(&self, org_id: &str, block_id: Uuid) -> Result<Vec<Backlink>> {
        self.store
            .get_block(org_id, block_id)
            .await?
            .ok_or(OceanError::not_found("block", block_id))?;
        self.backlinks(org_id, block_id, LinkTarget::Block).await
    }

    async fn backlinks(
        &self,
        org_id: &str,
        target_id: Uuid,
        target: LinkTarget,
    ) -> Result<Vec<Backlink>> {
        let filter = LinkFilter {
            target_id: Some(target_id),
            target: Some(target),
            ..Default::default()
        };
        let links = self.store.list_links(org_id, &filter).await?;

        let mut backlinks = Vec::with_capacity(links.len());
        for link in links {
            // Source block may have been deleted since; skip those links.
            let Some(source) = self.store.get_block(org_id, link.source_block_id).await? else {
                debug!(link_id = %link.id, "skipping backlink with missing source block");
                continue;
            };
            backlinks.push(Backlink {
                link_id: link.id,
                link_type: link.link_type,
                source_block_id: source.id,
                source_page_id: source.page_id,
                source_block_type: source.block_type().to_string(),
                source_content_preview: preview(&source.searchable_text(), PREVIEW_CHARS),
                created_at: link.created_at,
            });
        }
        backlinks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(backlinks)
    }

    /// Adjacency over the tenant's current block-to-block edges
    async fn block_edges(&self, org_id: &str) -> Result<HashMap<Uuid, Vec<Uuid>>> {
        let filter = LinkFilter {
            target: Some(LinkTarget::Block),
            ..Default::default()
        };
        let links = self.store.list_links(org_id, &filter).await?;
        let mut edges: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for link in links {
            edges.entry(link.source_block_id).or_default().push(link.target_id);
        }
        Ok(edges)
    }
}

/// BFS shortest path from `start` to `goal`, inclusive of both ends.
/// `start == goal` yields the single-node path.
fn shortest_path(
    edges: &HashMap<Uuid, Vec<Uuid>>,
    start: Uuid,
    goal: Uuid,
) -> Option<Vec<Uuid>> {
    if start == goal {
        return Some(vec![start]);
    }

    let mut prev: HashMap<Uuid, Uuid> = HashMap::new();
    let mut seen: HashSet<Uuid> = HashSet::from([start]);
    let mut queue: VecDeque<Uuid> = VecDeque::from([start]);

    while let Some(node) = queue.pop_front() {
        for &next in edges.get(&node).into_iter().flatten() {
            if !seen.insert(next) {
                continue;
            }
            prev.insert(next, node);
            if next == goal {
                let mut path = vec![goal];
                let mut cursor = goal;
                while let Some(&parent) = prev.get(&cursor) {
                    path.push(parent);
                    cursor = parent;
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(next);
        }
    }
    None
}
