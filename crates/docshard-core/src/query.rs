//! Tenant-scoped and cross-organization queries.

use docshard_storage::{
    DocumentPage, FieldFilter, OrderBy, PageOptions, SortDirection, StoredDocument,
};
use tracing::{instrument, warn};

use crate::error::{ShardingError, ShardingResult};
use crate::kind::CollectionKind;
use crate::store::ShardedStore;

/// Query pagination and ordering options.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Maximum records per page (backend default when unset).
    pub page_size: Option<u32>,
    /// Field to sort by; unset leaves the backend's ID order.
    pub order_field: Option<String>,
    /// Sort direction; defaults to descending when an order field is set.
    pub direction: Option<SortDirection>,
    /// Opaque cursor from a previous page's `next_cursor`.
    pub cursor: Option<String>,
}

impl QueryOptions {
    fn to_page_options(&self) -> PageOptions {
        PageOptions {
            page_size: self.page_size,
            page_token: self.cursor.clone(),
            order_by: self.order_field.as_ref().map(|field| OrderBy {
                field: field.clone(),
                direction: self.direction.unwrap_or(SortDirection::Descending),
            }),
        }
    }
}

/// One page of query results.
#[derive(Debug)]
pub struct QueryResult {
    pub records: Vec<StoredDocument>,
    /// Cursor for the next page, when one may exist.
    pub next_cursor: Option<String>,
    /// Page-full heuristic: true when the page came back full. A shard
    /// with exactly one full page remaining reports a false positive
    /// until the caller fetches the empty next page.
    pub has_more: bool,
}

impl From<DocumentPage> for QueryResult {
    fn from(page: DocumentPage) -> Self {
        let has_more = page.next_page_token.is_some();
        Self {
            records: page.documents,
            next_cursor: page.next_page_token,
            has_more,
        }
    }
}

impl ShardedStore {
    /// Queries one tenant's shard. Results can never include another
    /// tenant's documents: the query runs against the tenant's path and
    /// nothing else.
    #[instrument(skip(self, filters, options), fields(org = %organization_id, collection = %kind))]
    pub async fn query(
        &self,
        organization_id: &str,
        kind: CollectionKind,
        filters: &[FieldFilter],
        options: QueryOptions,
    ) -> ShardingResult<QueryResult> {
        let path = self.shard_path(organization_id, kind);
        let page = self
            .backend
            .query(&path, filters, &options.to_page_options())
            .await
            .map_err(|e| ShardingError::from_backend(organization_id, kind.as_str(), "query", e))?;
        Ok(page.into())
    }

    /// Queries a collection kind across every tenant's shard.
    ///
    /// Disabled by default; fails with
    /// [`ShardingError::CrossOrgQueriesDisabled`] before any I/O unless
    /// both `enable_collection_groups` and `enable_cross_org_queries` are
    /// set. Intended only for system-wide administrative reporting.
    #[instrument(skip(self, filters, options), fields(collection = %kind))]
    pub async fn cross_org_query(
        &self,
        kind: CollectionKind,
        filters: &[FieldFilter],
        options: QueryOptions,
    ) -> ShardingResult<QueryResult> {
        let config = self.config();
        if !(config.enable_collection_groups && config.enable_cross_org_queries) {
            return Err(ShardingError::CrossOrgQueriesDisabled);
        }
        warn!(collection = %kind, "cross-organization query executed");

        let page = self
            .backend
            .query_group(kind.as_str(), filters, &options.to_page_options())
            .await
            .map_err(|e| {
                ShardingError::from_backend("<all>", kind.as_str(), "cross_org_query", e)
            })?;
        Ok(page.into())
    }
}
