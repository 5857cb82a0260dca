//! Atomic batch writes.
//!
//! A batch may mix tenants and operation kinds; the whole list commits
//! as one unit. Validation is fail-fast and happens before any backend
//! call — a malformed operation rejects the entire batch rather than
//! being silently skipped, which would contradict the all-or-nothing
//! guarantee.

use docshard_storage::{FieldMap, WriteOp};
use tracing::{debug, instrument};

use crate::error::{ShardingError, ShardingResult};
use crate::kind::CollectionKind;
use crate::path::TENANT_ROOT;
use crate::store::ShardedStore;

/// Upper bound on operations per batch, matching the backend's atomic
/// commit limit.
pub const MAX_BATCH_OPS: usize = 500;

/// One write in a batch. The typed variants make invalid shapes —
/// an update without an ID, a delete with a payload — unrepresentable.
#[derive(Debug, Clone)]
pub enum BatchOperation {
    Create {
        organization_id: String,
        collection: CollectionKind,
        /// Explicit ID upserts; `None` lets the backend assign one.
        doc_id: Option<String>,
        data: FieldMap,
    },
    Update {
        organization_id: String,
        collection: CollectionKind,
        doc_id: String,
        data: FieldMap,
    },
    Delete {
        organization_id: String,
        collection: CollectionKind,
        doc_id: String,
    },
}

impl BatchOperation {
    fn organization_id(&self) -> &str {
        match self {
            BatchOperation::Create { organization_id, .. }
            | BatchOperation::Update { organization_id, .. }
            | BatchOperation::Delete { organization_id, .. } => organization_id,
        }
    }

    fn validate(&self, index: usize) -> ShardingResult<()> {
        let invalid = |message: String| ShardingError::InvalidBatchOperation { index, message };

        if self.organization_id().is_empty() {
            return Err(invalid("organization_id must not be empty".to_string()));
        }
        match self {
            BatchOperation::Create { doc_id: Some(id), .. } if id.is_empty() => {
                Err(invalid("explicit doc_id must not be empty".to_string()))
            }
            BatchOperation::Update { doc_id, data, .. } => {
                if doc_id.is_empty() {
                    Err(invalid("update requires a doc_id".to_string()))
                } else if data.is_empty() {
                    Err(invalid("update requires a non-empty payload".to_string()))
                } else {
                    Ok(())
                }
            }
            BatchOperation::Delete { doc_id, .. } if doc_id.is_empty() => {
                Err(invalid("delete requires a doc_id".to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// Recovers the organization segment from a shard path for error context.
fn org_from_path(path: &str) -> &str {
    let mut segments = path.split('/');
    match (segments.next(), segments.next()) {
        (Some(TENANT_ROOT), Some(org)) => org,
        _ => path,
    }
}

impl ShardedStore {
    /// Commits a heterogeneous list of operations atomically: total
    /// success or total rollback, with no partial state visible to
    /// readers. An empty batch is a no-op.
    #[instrument(skip(self, operations), fields(ops = operations.len()))]
    pub async fn batch_write(&self, operations: Vec<BatchOperation>) -> ShardingResult<()> {
        if operations.is_empty() {
            return Ok(());
        }
        if operations.len() > MAX_BATCH_OPS {
            return Err(ShardingError::InvalidBatchOperation {
                index: MAX_BATCH_OPS,
                message: format!(
                    "batch of {} operations exceeds the limit of {MAX_BATCH_OPS}",
                    operations.len()
                ),
            });
        }
        for (index, op) in operations.iter().enumerate() {
            op.validate(index)?;
        }

        let ops: Vec<WriteOp> = operations
            .into_iter()
            .map(|op| match op {
                BatchOperation::Create { organization_id, collection, doc_id, data } => {
                    let path = self.shard_path(&organization_id, collection);
                    let write = Self::create_write(&organization_id, data);
                    match doc_id {
                        Some(id) => WriteOp::Set { path, id, write },
                        None => WriteOp::Insert { path, write },
                    }
                }
                BatchOperation::Update { organization_id, collection, doc_id, data } => {
                    WriteOp::Merge {
                        path: self.shard_path(&organization_id, collection),
                        id: doc_id,
                        write: Self::update_write(data),
                    }
                }
                BatchOperation::Delete { organization_id, collection, doc_id } => WriteOp::Delete {
                    path: self.shard_path(&organization_id, collection),
                    id: doc_id,
                },
            })
            .collect();

        let count = ops.len();
        self.backend.commit(ops).await.map_err(|e| match e {
            docshard_storage::BackendError::NotFound { path, doc_id } => {
                ShardingError::DocumentNotFound {
                    organization_id: org_from_path(&path).to_string(),
                    collection: path.rsplit('/').next().unwrap_or(&path).to_string(),
                    doc_id,
                }
            }
            other => ShardingError::from_backend("<batch>", "<mixed>", "batch_write", other),
        })?;
        debug!(ops = count, "batch committed");
        Ok(())
    }
}
