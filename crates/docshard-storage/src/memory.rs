//! In-memory backend implementation for testing and embedded use.
//!
//! The whole document tree lives behind a single `RwLock` so that batch
//! commits are genuinely atomic across collections and readers never see
//! a half-applied batch. The original runtime this layer was modeled on
//! was single-threaded; with real OS threads the lock is required, not
//! optional.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use ulid::Ulid;

use crate::clock::{Clock, SystemClock};
use crate::error::{BackendError, BackendResult};
use crate::traits::{
    compare_values, parse_page_token, DocCursor, DocumentBackend, DocumentPage, DocumentWrite,
    FieldFilter, FieldMap, FieldWrite, FilterOp, PageOptions, SortDirection, StoredDocument,
    WriteOp, DEFAULT_PAGE_SIZE,
};

/// Collection path -> (document ID -> fields). BTreeMap keeps documents
/// in ID order, which is the fallback query ordering.
type Collections = HashMap<String, BTreeMap<String, FieldMap>>;

/// In-memory implementation of [`DocumentBackend`].
///
/// # Performance Characteristics
///
/// - **Point read/write**: O(log N) in documents per collection
/// - **Query**: O(N log N) over the collection (filter + sort)
/// - **Batch commit**: O(K log N) for K operations, under one write lock
///
/// Timestamps for [`FieldWrite::ServerTime`] come from the injected
/// [`Clock`]; all operations in one batch commit share a single instant.
pub struct MemoryBackend {
    tree: RwLock<Collections>,
    /// Path prefixes rejected with PermissionDenied. Emulates the
    /// access-control rules a hosted backend would enforce.
    denied_prefixes: RwLock<Vec<String>>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Creates a backend using the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a backend with an explicit clock (tests pin time this way).
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tree: RwLock::new(Collections::new()),
            denied_prefixes: RwLock::new(Vec::new()),
            clock,
        }
    }

    /// Creates a backend wrapped in Arc.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Rejects every operation under `prefix` with PermissionDenied.
    pub fn deny_path_prefix(&self, prefix: impl Into<String>) {
        self.write_lock(&self.denied_prefixes).push(prefix.into());
    }

    /// Clears all configured access denials.
    pub fn clear_denied_prefixes(&self) {
        self.write_lock(&self.denied_prefixes).clear();
    }

    fn read_lock<'a, T>(&self, lock: &'a RwLock<T>) -> RwLockReadGuard<'a, T> {
        lock.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock<'a, T>(&self, lock: &'a RwLock<T>) -> RwLockWriteGuard<'a, T> {
        lock.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_access(&self, path: &str) -> BackendResult<()> {
        let denied = self.read_lock(&self.denied_prefixes);
        if let Some(prefix) = denied.iter().find(|p| path.starts_with(p.as_str())) {
            return Err(BackendError::PermissionDenied {
                path: path.to_string(),
                message: format!("rules deny access under '{prefix}'"),
            });
        }
        Ok(())
    }
}

fn timestamp_value(now: DateTime<Utc>) -> Value {
    serde_json::to_value(now).unwrap_or(Value::Null)
}

/// Applies a write's fields over `base`, resolving server-time sentinels.
fn apply_write(base: &mut FieldMap, write: &DocumentWrite, now: DateTime<Utc>) {
    for (field, value) in &write.fields {
        let resolved = match value {
            FieldWrite::Value(v) => v.clone(),
            FieldWrite::ServerTime => timestamp_value(now),
        };
        base.insert(field.clone(), resolved);
    }
}

fn same_scalar_type(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Null, Value::Null)
            | (Value::Bool(_), Value::Bool(_))
            | (Value::Number(_), Value::Number(_))
            | (Value::String(_), Value::String(_))
    )
}

/// A document with no value for the filtered field never matches,
/// including under `Ne`. Range operators require both sides to be
/// scalars of the same JSON type.
fn matches_filters(fields: &FieldMap, filters: &[FieldFilter]) -> bool {
    filters.iter().all(|f| {
        let Some(actual) = fields.get(&f.field) else {
            return false;
        };
        match f.op {
            FilterOp::Eq => actual == &f.value,
            FilterOp::Ne => actual != &f.value,
            FilterOp::Lt | FilterOp::Le | FilterOp::Gt | FilterOp::Ge => {
                if !same_scalar_type(actual, &f.value) {
                    return false;
                }
                let ord = compare_values(actual, &f.value);
                matches!(
                    (f.op, ord),
                    (FilterOp::Lt, Ordering::Less)
                        | (FilterOp::Le, Ordering::Less | Ordering::Equal)
                        | (FilterOp::Gt, Ordering::Greater)
                        | (FilterOp::Ge, Ordering::Greater | Ordering::Equal)
                )
            }
        }
    })
}

type SortKey = (Option<Value>, String, String);

fn sort_key(doc: &StoredDocument, order_field: Option<&str>) -> SortKey {
    let sort_value = order_field.and_then(|f| doc.fields.get(f).cloned());
    (sort_value, doc.id.clone(), doc.path.clone())
}

/// Ascending composite order: sort value (missing sorts first), then
/// document ID, then path.
fn key_cmp(a: &SortKey, b: &SortKey) -> Ordering {
    let by_value = match (&a.0, &b.0) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => compare_values(x, y),
    };
    by_value.then_with(|| a.1.cmp(&b.1)).then_with(|| a.2.cmp(&b.2))
}

/// Shared filter/sort/paginate pipeline for `query` and `query_group`.
fn run_query(
    mut docs: Vec<StoredDocument>,
    filters: &[FieldFilter],
    page: &PageOptions,
) -> BackendResult<DocumentPage> {
    docs.retain(|d| matches_filters(&d.fields, filters));

    let order_field = page.order_by.as_ref().map(|o| o.field.as_str());
    let descending = matches!(
        page.order_by.as_ref().map(|o| o.direction),
        Some(SortDirection::Descending)
    );
    let presented = |a: &SortKey, b: &SortKey| {
        let ord = key_cmp(a, b);
        if descending {
            ord.reverse()
        } else {
            ord
        }
    };

    docs.sort_by(|a, b| presented(&sort_key(a, order_field), &sort_key(b, order_field)));

    let start = match parse_page_token(&page.page_token)? {
        Some(cursor) => {
            let cursor_key = (cursor.sort_value, cursor.doc_id, cursor.path);
            docs.partition_point(|d| {
                presented(&sort_key(d, order_field), &cursor_key) != Ordering::Greater
            })
        }
        None => 0,
    };

    let limit = page.page_size.unwrap_or(DEFAULT_PAGE_SIZE) as usize;
    let documents: Vec<StoredDocument> = docs.into_iter().skip(start).take(limit).collect();

    // Full page means there may be more; the cursor is the last item's key.
    let next_page_token = if limit > 0 && documents.len() == limit {
        documents.last().map(|d| {
            let (sort_value, doc_id, path) = sort_key(d, order_field);
            DocCursor { sort_value, doc_id, path }.encode()
        })
    } else {
        None
    };

    Ok(DocumentPage { documents, next_page_token })
}

fn collection_docs(tree: &Collections, path: &str) -> Vec<StoredDocument> {
    tree.get(path)
        .map(|docs| {
            docs.iter()
                .map(|(id, fields)| StoredDocument {
                    id: id.clone(),
                    path: path.to_string(),
                    fields: fields.clone(),
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    async fn insert(&self, path: &str, write: DocumentWrite) -> BackendResult<String> {
        self.check_access(path)?;
        let now = self.clock.now();
        let id = Ulid::new().to_string();
        let mut fields = FieldMap::new();
        apply_write(&mut fields, &write, now);
        let mut tree = self.write_lock(&self.tree);
        tree.entry(path.to_string()).or_default().insert(id.clone(), fields);
        Ok(id)
    }

    async fn set(&self, path: &str, id: &str, write: DocumentWrite) -> BackendResult<()> {
        self.check_access(path)?;
        let now = self.clock.now();
        let mut fields = FieldMap::new();
        apply_write(&mut fields, &write, now);
        let mut tree = self.write_lock(&self.tree);
        tree.entry(path.to_string()).or_default().insert(id.to_string(), fields);
        Ok(())
    }

    async fn get(&self, path: &str, id: &str) -> BackendResult<Option<StoredDocument>> {
        self.check_access(path)?;
        let tree = self.read_lock(&self.tree);
        Ok(tree.get(path).and_then(|docs| docs.get(id)).map(|fields| StoredDocument {
            id: id.to_string(),
            path: path.to_string(),
            fields: fields.clone(),
        }))
    }

    async fn merge(&self, path: &str, id: &str, write: DocumentWrite) -> BackendResult<()> {
        self.check_access(path)?;
        let now = self.clock.now();
        let mut tree = self.write_lock(&self.tree);
        let fields = tree
            .get_mut(path)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| BackendError::NotFound {
                path: path.to_string(),
                doc_id: id.to_string(),
            })?;
        apply_write(fields, &write, now);
        Ok(())
    }

    async fn delete(&self, path: &str, id: &str) -> BackendResult<()> {
        self.check_access(path)?;
        let mut tree = self.write_lock(&self.tree);
        if let Some(docs) = tree.get_mut(path) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn query(
        &self,
        path: &str,
        filters: &[FieldFilter],
        page: &PageOptions,
    ) -> BackendResult<DocumentPage> {
        self.check_access(path)?;
        let docs = {
            let tree = self.read_lock(&self.tree);
            collection_docs(&tree, path)
        };
        run_query(docs, filters, page)
    }

    async fn query_group(
        &self,
        collection: &str,
        filters: &[FieldFilter],
        page: &PageOptions,
    ) -> BackendResult<DocumentPage> {
        let docs = {
            let tree = self.read_lock(&self.tree);
            let mut docs = Vec::new();
            for path in tree.keys() {
                let last_segment = path.rsplit('/').next().unwrap_or(path.as_str());
                if last_segment == collection {
                    self.check_access(path)?;
                    docs.extend(collection_docs(&tree, path));
                }
            }
            docs
        };
        run_query(docs, filters, page)
    }

    async fn commit(&self, ops: Vec<WriteOp>) -> BackendResult<()> {
        let now = self.clock.now();
        let mut tree = self.write_lock(&self.tree);

        // Validation pass: nothing is applied unless every op can commit.
        for op in &ops {
            match op {
                WriteOp::Insert { path, .. }
                | WriteOp::Set { path, .. }
                | WriteOp::Delete { path, .. } => self.check_access(path)?,
                WriteOp::Merge { path, id, .. } => {
                    self.check_access(path)?;
                    if tree.get(path).and_then(|docs| docs.get(id)).is_none() {
                        return Err(BackendError::NotFound {
                            path: path.clone(),
                            doc_id: id.clone(),
                        });
                    }
                }
            }
        }

        for op in ops {
            match op {
                WriteOp::Insert { path, write } => {
                    let mut fields = FieldMap::new();
                    apply_write(&mut fields, &write, now);
                    tree.entry(path).or_default().insert(Ulid::new().to_string(), fields);
                }
                WriteOp::Set { path, id, write } => {
                    let mut fields = FieldMap::new();
                    apply_write(&mut fields, &write, now);
                    tree.entry(path).or_default().insert(id, fields);
                }
                WriteOp::Merge { path, id, write } => {
                    // Existence was checked in the validation pass.
                    if let Some(fields) = tree.get_mut(&path).and_then(|docs| docs.get_mut(&id)) {
                        apply_write(fields, &write, now);
                    }
                }
                WriteOp::Delete { path, id } => {
                    if let Some(docs) = tree.get_mut(&path) {
                        docs.remove(&id);
                    }
                }
            }
        }
        Ok(())
    }
}
