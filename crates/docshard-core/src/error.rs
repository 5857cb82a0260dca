//! Sharding service error types.
//!
//! Every backend failure is rethrown with tenant, collection, and
//! operation context attached; permission failures and missing update
//! targets get their own variants so callers can react specifically.

use docshard_storage::BackendError;
use thiserror::Error;

/// Errors surfaced by the sharding service.
#[derive(Debug, Error)]
pub enum ShardingError {
    /// Update target does not exist. Reads return `None` instead, and
    /// deletes are idempotent; only updates require an existing target.
    #[error("document not found: {organization_id}/{collection}/{doc_id}")]
    DocumentNotFound {
        organization_id: String,
        collection: String,
        doc_id: String,
    },

    /// Backend access-control rules rejected the operation.
    #[error("permission denied for {operation} on {organization_id}/{collection}: {message}")]
    PermissionDenied {
        organization_id: String,
        collection: String,
        operation: &'static str,
        message: String,
    },

    /// Cross-tenant query attempted while the feature flags are off.
    /// Raised before any I/O.
    #[error(
        "cross-organization queries are disabled; enable both \
         enable_collection_groups and enable_cross_org_queries"
    )]
    CrossOrgQueriesDisabled,

    /// A batch operation failed validation; nothing was committed.
    #[error("invalid batch operation at index {index}: {message}")]
    InvalidBatchOperation { index: usize, message: String },

    /// Pagination cursor could not be decoded.
    #[error("invalid cursor: {message}")]
    InvalidCursor { message: String },

    /// Collection kind name outside the known set.
    #[error("unknown collection kind: {name}")]
    UnknownCollectionKind { name: String },

    /// Any other backend failure, with operation context attached.
    #[error("{operation} failed for {organization_id}/{collection}: {source}")]
    Backend {
        organization_id: String,
        collection: String,
        operation: &'static str,
        #[source]
        source: BackendError,
    },
}

/// Result type for sharding operations.
pub type ShardingResult<T> = Result<T, ShardingError>;

impl ShardingError {
    /// Wraps a backend error with tenant/collection/operation context,
    /// promoting the permission and cursor classes to their own variants.
    pub(crate) fn from_backend(
        organization_id: &str,
        collection: &str,
        operation: &'static str,
        source: BackendError,
    ) -> Self {
        match source {
            BackendError::PermissionDenied { message, .. } => ShardingError::PermissionDenied {
                organization_id: organization_id.to_string(),
                collection: collection.to_string(),
                operation,
                message,
            },
            BackendError::InvalidCursor { message } => ShardingError::InvalidCursor { message },
            other => ShardingError::Backend {
                organization_id: organization_id.to_string(),
                collection: collection.to_string(),
                operation,
                source: other,
            },
        }
    }
}
