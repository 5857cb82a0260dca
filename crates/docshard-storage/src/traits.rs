//! DocumentBackend trait definition and query types.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BackendError, BackendResult};

/// Page size applied when the caller does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// The fields of one stored document.
pub type FieldMap = serde_json::Map<String, Value>;

/// A value written to one document field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldWrite {
    /// A literal JSON value.
    Value(Value),
    /// Sentinel replaced with the backend clock's time at commit.
    /// Materialized as an RFC 3339 string.
    ServerTime,
}

/// The field set of one write operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentWrite {
    pub fields: HashMap<String, FieldWrite>,
}

impl DocumentWrite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a write from plain JSON fields.
    pub fn from_map(map: FieldMap) -> Self {
        let fields = map
            .into_iter()
            .map(|(k, v)| (k, FieldWrite::Value(v)))
            .collect();
        Self { fields }
    }

    pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
        self.fields.insert(field.into(), FieldWrite::Value(value));
        self
    }

    pub fn set_server_time(mut self, field: impl Into<String>) -> Self {
        self.fields.insert(field.into(), FieldWrite::ServerTime);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A document read back from the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    /// Collection path the document lives under.
    pub path: String,
    pub fields: FieldMap,
}

/// Comparison operator for a field filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// One filter clause, matched against a single document field.
///
/// Range operators apply the scalar order from [`compare_values`]; a
/// range comparison between values of different JSON types never matches.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl FieldFilter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: Value) -> Self {
        Self { field: field.into(), op, value }
    }

    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }
}

/// Sort direction for an ordered query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Ordering clause for a query.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: SortDirection::Ascending }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: SortDirection::Descending }
    }
}

/// Pagination options for a query.
#[derive(Debug, Clone, Default)]
pub struct PageOptions {
    /// Maximum documents returned; defaults to [`DEFAULT_PAGE_SIZE`].
    pub page_size: Option<u32>,
    /// Opaque token from a previous page's `next_page_token`.
    pub page_token: Option<String>,
    pub order_by: Option<OrderBy>,
}

/// One page of query results.
#[derive(Debug, Clone)]
pub struct DocumentPage {
    pub documents: Vec<StoredDocument>,
    /// Present when the page came back full; resume with it in
    /// [`PageOptions::page_token`].
    pub next_page_token: Option<String>,
}

/// Decoded pagination cursor: the composite sort key of the last
/// document returned by the previous page.
///
/// Ties on `sort_value` break by document ID, then collection path, so
/// pagination order is a total order even across collection-group scans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocCursor {
    pub sort_value: Option<Value>,
    pub doc_id: String,
    pub path: String,
}

impl DocCursor {
    /// Encodes the cursor as an opaque base64 token.
    pub fn encode(&self) -> String {
        // Serialization of this struct cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        BASE64.encode(json)
    }

    /// Decodes a token produced by [`DocCursor::encode`].
    pub fn decode(token: &str) -> BackendResult<Self> {
        let bytes = BASE64
            .decode(token)
            .map_err(|e| BackendError::InvalidCursor { message: format!("bad base64: {e}") })?;
        serde_json::from_slice(&bytes)
            .map_err(|e| BackendError::InvalidCursor { message: format!("bad cursor json: {e}") })
    }
}

/// Parses an optional page token into a cursor.
pub fn parse_page_token(token: &Option<String>) -> BackendResult<Option<DocCursor>> {
    match token {
        Some(t) => Ok(Some(DocCursor::decode(t)?)),
        None => Ok(None),
    }
}

/// Total order over JSON values used for sorting and range filters:
/// Null < Bool < Number < String < Array < Object. Numbers compare as
/// f64 with a total order; arrays and objects compare by their
/// serialized form (deterministic, not meaningful for ranges).
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            a.to_string().cmp(&b.to_string())
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

/// One operation in an atomic batch commit.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Create with a backend-assigned ID.
    Insert { path: String, write: DocumentWrite },
    /// Upsert by explicit ID (overwrite semantics).
    Set { path: String, id: String, write: DocumentWrite },
    /// Field-level merge; the target must exist.
    Merge { path: String, id: String, write: DocumentWrite },
    /// Idempotent delete.
    Delete { path: String, id: String },
}

/// Abstract interface over a hierarchical document database.
///
/// Required backend semantics: per-document atomic writes, atomic
/// multi-document batch commits, server-assigned timestamps for the
/// [`FieldWrite::ServerTime`] sentinel, and collection-group queries
/// (same-named collections at any path depth).
///
/// Implementations must be thread-safe (Send + Sync) and support
/// async operations.
#[async_trait]
pub trait DocumentBackend: Send + Sync + 'static {
    /// Creates a document with a backend-assigned unique ID.
    async fn insert(&self, path: &str, write: DocumentWrite) -> BackendResult<String>;

    /// Creates or fully overwrites a document at an explicit ID.
    async fn set(&self, path: &str, id: &str, write: DocumentWrite) -> BackendResult<()>;

    /// Reads one document. Returns `None` when it does not exist.
    async fn get(&self, path: &str, id: &str) -> BackendResult<Option<StoredDocument>>;

    /// Merges fields into an existing document. Fails with
    /// [`BackendError::NotFound`] when the target does not exist.
    async fn merge(&self, path: &str, id: &str, write: DocumentWrite) -> BackendResult<()>;

    /// Deletes a document. Deleting a nonexistent document succeeds.
    async fn delete(&self, path: &str, id: &str) -> BackendResult<()>;

    /// Queries one collection path with filters and cursor pagination.
    async fn query(
        &self,
        path: &str,
        filters: &[FieldFilter],
        page: &PageOptions,
    ) -> BackendResult<DocumentPage>;

    /// Queries every collection whose final path segment equals
    /// `collection`, at any depth.
    async fn query_group(
        &self,
        collection: &str,
        filters: &[FieldFilter],
        page: &PageOptions,
    ) -> BackendResult<DocumentPage>;

    /// Commits a batch atomically: either every operation applies or
    /// none do. A `Merge` whose target is missing aborts the batch.
    async fn commit(&self, ops: Vec<WriteOp>) -> BackendResult<()>;
}
