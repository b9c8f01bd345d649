//! Remote document store and vector index client
//!
//! Speaks the remote store's operation envelope: every call is
//! `POST {base}/v1/execute` with `{ "operation": ..., "params": ... }`
//! and a `{ "success": bool, "result": ... }` reply. Rows are the serde
//! JSON form of the domain types, kept in one table per entity.
//!
//! The remote backend is eventually consistent: a row written here may
//! not be visible to an immediately following query. Services are built
//! for that — they return the record they just wrote instead of reading
//! it back. The store can only push equality filters down, so typed
//! filters (type sets, tag sets, date ranges) are applied locally after
//! the scan, mirroring what the index can and cannot do.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use ocean_core::traits::store::{BlockFilter, DocumentStore, LinkFilter};
use ocean_core::traits::vector::{VectorFilter, VectorHit, VectorIndex, VectorMetadata};
use ocean_core::types::{Block, Link, Page, PageFilter, Tag};
use ocean_core::{OceanConfig, OceanError, Result};

const PAGES_TABLE: &str = "ocean_pages";
const BLOCKS_TABLE: &str = "ocean_blocks";
const LINKS_TABLE: &str = "ocean_links";
const TAGS_TABLE: &str = "ocean_tags";

/// Cap on rows pulled for one scan; matches the remote API's page size
const SCAN_LIMIT: usize = 1000;

/// HTTP client for the remote document store and vector index
pub struct RemoteStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    project_id: String,
}

impl RemoteStore {
    /// Create a client from configuration
    pub fn new(config: &OceanConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()
            .map_err(|e| OceanError::upstream(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_base().to_string(),
            api_key: config.api_key.clone(),
            project_id: config.project_id.clone(),
        })
    }

    /// Send one operation envelope and return the `result` payload
    async fn execute(&self, operation: &str, mut params: Value) -> Result<Value> {
        params["project_id"] = json!(self.project_id);
        debug!(operation, "executing store operation");

        let response = self
            .client
            .post(format!("{}/v1/execute", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({ "operation": operation, "params": params }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OceanError::upstream(format!("store operation {operation} timed out"))
                } else {
                    OceanError::upstream(format!("store operation {operation} failed: {e}"))
                }
            })?;

        if !response.status().is_success() {
            return Err(OceanError::upstream(format!(
                "store operation {operation} returned {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| OceanError::upstream(format!("invalid store response: {e}")))?;

        if body.get("success").and_then(Value::as_bool) != Some(true) {
            warn!(operation, "store reported failure");
            return Err(OceanError::upstream(format!(
                "store operation {operation} was rejected"
            )));
        }

        Ok(body.get("result").cloned().unwrap_or(Value::Null))
    }

    async fn insert_rows<T: Serialize>(&self, table: &str, rows: &[T]) -> Result<()> {
        let rows: Vec<Value> = rows
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| OceanError::upstream(format!("failed to serialize rows: {e}")))?;
        self.execute("insert_rows", json!({ "table_name": table, "rows": rows }))
            .await?;
        Ok(())
    }

    /// Scan a table with an equality filter and deserialize the rows
    async fn query_rows<T: DeserializeOwned>(&self, table: &str, filter: Value) -> Result<Vec<T>> {
        let result = self
            .execute(
                "query_rows",
                json!({ "table_name": table, "filter": filter, "limit": SCAN_LIMIT }),
            )
            .await?;

        let rows = result
            .get("rows")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| OceanError::upstream(format!("malformed {table} row: {e}")))
            })
            .collect()
    }

    async fn update_row<T: Serialize>(&self, table: &str, org_id: &str, id: Uuid, row: &T) -> Result<()> {
        let update = serde_json::to_value(row)
            .map_err(|e| OceanError::upstream(format!("failed to serialize row: {e}")))?;
        self.execute(
            "update_rows",
            json!({
                "table_name": table,
                "filter": { "id": id, "org_id": org_id },
                "update": update,
            }),
        )
        .await?;
        Ok(())
    }

    async fn delete_row(&self, table: &str, org_id: &str, id: Uuid) -> Result<bool> {
        let result = self
            .execute(
                "delete_rows",
                json!({
                    "table_name": table,
                    "filter": { "id": id, "org_id": org_id },
                }),
            )
            .await?;
        Ok(result.get("deleted_count").and_then(Value::as_u64).unwrap_or(0) > 0)
    }
}

#[async_trait]
impl DocumentStore for RemoteStore {
    async fn insert_page(&self, page: Page) -> Result<()> {
        self.insert_rows(PAGES_TABLE, &[page]).await
    }

    async fn get_page(&self, org_id: &str, id: Uuid) -> Result<Option<Page>> {
        let rows: Vec<Page> = self
            .query_rows(PAGES_TABLE, json!({ "id": id, "org_id": org_id }))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn list_pages(
        &self,
        org_id: &str,
        filter: &PageFilter,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<Page>, usize)> {
        let rows: Vec<Page> = self
            .query_rows(PAGES_TABLE, json!({ "org_id": org_id }))
            .await?;
        let mut pages: Vec<Page> = rows.into_iter().filter(|p| filter.matches(p)).collect();
        pages.sort_by(|a, b| {
            a.parent_page_id
                .cmp(&b.parent_page_id)
                .then(a.position.cmp(&b.position))
        });
        let total = pages.len();
        Ok((pages.into_iter().skip(offset).take(limit).collect(), total))
    }

    async fn update_page(&self, page: &Page) -> Result<()> {
        self.update_row(PAGES_TABLE, &page.org_id, page.id, page).await
    }

    async fn insert_block(&self, block: Block) -> Result<()> {
        self.insert_rows(BLOCKS_TABLE, &[block]).await
    }

    async fn insert_blocks(&self, blocks: Vec<Block>) -> Result<()> {
        if blocks.is_empty() {
            return Ok(());
        }
        self.insert_rows(BLOCKS_TABLE, &blocks).await
    }

    async fn get_block(&self, org_id: &str, id: Uuid) -> Result<Option<Block>> {
        let rows: Vec<Block> = self
            .query_rows(BLOCKS_TABLE, json!({ "id": id, "org_id": org_id }))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn list_blocks(
        &self,
        org_id: &str,
        filter: &BlockFilter,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<Block>, usize)> {
        // Push page scoping down as an equality filter; everything else
        // is applied locally.
        let mut scan_filter = json!({ "org_id": org_id });
        if let Some(page_id) = filter.page_id {
            scan_filter["page_id"] = json!(page_id);
        }
        let rows: Vec<Block> = self.query_rows(BLOCKS_TABLE, scan_filter).await?;
        let mut blocks: Vec<Block> = rows.into_iter().filter(|b| filter.matches(b)).collect();
        if filter.page_id.is_some() {
            blocks.sort_by_key(|b| b.position);
        } else {
            blocks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        let total = blocks.len();
        Ok((blocks.into_iter().skip(offset).take(limit).collect(), total))
    }

    async fn update_block(&self, block: &Block) -> Result<()> {
        self.update_row(BLOCKS_TABLE, &block.org_id, block.id, block)
            .await
    }

    async fn update_blocks(&self, blocks: &[Block]) -> Result<()> {
        for block in blocks {
            self.update_row(BLOCKS_TABLE, &block.org_id, block.id, block)
                .await?;
        }
        Ok(())
    }

    async fn delete_block(&self, org_id: &str, id: Uuid) -> Result<bool> {
        self.delete_row(BLOCKS_TABLE, org_id, id).await
    }

    async fn count_blocks(&self, org_id: &str, page_id: Uuid) -> Result<usize> {
        let rows: Vec<Block> = self
            .query_rows(BLOCKS_TABLE, json!({ "org_id": org_id, "page_id": page_id }))
            .await?;
        Ok(rows.len())
    }

    async fn insert_link(&self, link: Link) -> Result<()> {
        self.insert_rows(LINKS_TABLE, &[link]).await
    }

    async fn get_link(&self, org_id: &str, id: Uuid) -> Result<Option<Link>> {
        let rows: Vec<Link> = self
            .query_rows(LINKS_TABLE, json!({ "id": id, "org_id": org_id }))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn list_links(&self, org_id: &str, filter: &LinkFilter) -> Result<Vec<Link>> {
        let rows: Vec<Link> = self
            .query_rows(LINKS_TABLE, json!({ "org_id": org_id }))
            .await?;
        let mut links: Vec<Link> = rows.into_iter().filter(|l| filter.matches(l)).collect();
        links.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(links)
    }

    async fn delete_link(&self, org_id: &str, id: Uuid) -> Result<bool> {
        self.delete_row(LINKS_TABLE, org_id, id).await
    }

    async fn insert_tag(&self, tag: Tag) -> Result<()> {
        self.insert_rows(TAGS_TABLE, &[tag]).await
    }

    async fn get_tag(&self, org_id: &str, id: Uuid) -> Result<Option<Tag>> {
        let rows: Vec<Tag> = self
            .query_rows(TAGS_TABLE, json!({ "id": id, "org_id": org_id }))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn list_tags(&self, org_id: &str) -> Result<Vec<Tag>> {
        let mut tags: Vec<Tag> = self
            .query_rows(TAGS_TABLE, json!({ "org_id": org_id }))
            .await?;
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn update_tag(&self, tag: &Tag) -> Result<()> {
        self.update_row(TAGS_TABLE, &tag.org_id, tag.id, tag).await
    }

    async fn delete_tag(&self, org_id: &str, id: Uuid) -> Result<bool> {
        self.delete_row(TAGS_TABLE, org_id, id).await
    }
}

#[async_trait]
impl VectorIndex for RemoteStore {
    async fn upsert(
        &self,
        namespace: &str,
        id: Uuid,
        vector: Vec<f32>,
        metadata: VectorMetadata,
    ) -> Result<()> {
        self.execute(
            "upsert_vector",
            json!({
                "namespace": namespace,
                "vector_id": id,
                "vector": vector,
                "metadata": metadata,
            }),
        )
        .await?;
        Ok(())
    }

    async fn delete(&self, namespace: &str, id: Uuid) -> Result<()> {
        self.execute(
            "delete_vector",
            json!({ "namespace": namespace, "vector_id": id }),
        )
        .await?;
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
        let mut index_filter = json!({});
        if let Some(page_id) = filter.page_id {
            index_filter["page_id"] = json!(page_id);
        }
        if let Some(block_type) = filter.block_type {
            index_filter["block_type"] = json!(block_type);
        }

        let result = self
            .execute(
                "search_vectors",
                json!({
                    "namespace": namespace,
                    "query_vector": query,
                    "filter": index_filter,
                    "top_k": top_k,
                    "min_score": min_score,
                }),
            )
            .await?;

        let rows = result
            .get("matches")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        rows.into_iter()
            .map(|row| {
                let id = row
                    .get("vector_id")
                    .and_then(Value::as_str)
                    .and_then(|s| Uuid::parse_str(s).ok())
                    .ok_or_else(|| OceanError::upstream("vector match missing vector_id"))?;
                let score = row
                    .get("score")
                    .and_then(Value::as_f64)
                    .ok_or_else(|| OceanError::upstream("vector match missing score"))?
                    as f32;
                let metadata: VectorMetadata = serde_json::from_value(
                    row.get("metadata").cloned().unwrap_or(Value::Null),
                )
                .map_err(|e| OceanError::upstream(format!("malformed vector metadata: {e}")))?;
                Ok(VectorHit { id, score, metadata })
            })
            .collect()
    }
}
