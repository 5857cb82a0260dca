//! Backend error types.

use thiserror::Error;

/// Errors surfaced by a [`crate::traits::DocumentBackend`] implementation.
///
/// Permission failures are a distinct variant so callers can present
/// "access denied" instead of "try again"; `Unavailable` and
/// `QuotaExceeded` are the transient classes a caller may retry.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Target document does not exist (merge requires an existing target).
    #[error("document not found: {path}/{doc_id}")]
    NotFound { path: String, doc_id: String },

    /// Access-control rules rejected the operation.
    #[error("permission denied at {path}: {message}")]
    PermissionDenied { path: String, message: String },

    /// Backend quota exhausted.
    #[error("quota exceeded: {message}")]
    QuotaExceeded { message: String },

    /// Page token could not be decoded.
    #[error("invalid page token: {message}")]
    InvalidCursor { message: String },

    /// Network or backend outage.
    #[error("backend unavailable: {message}")]
    Unavailable { message: String },

    /// Malformed request or internal backend failure.
    #[error("internal backend error: {message}")]
    Internal { message: String },
}

impl BackendError {
    /// Whether a retry could plausibly succeed without any change by the caller.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BackendError::Unavailable { .. } | BackendError::QuotaExceeded { .. }
        )
    }
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;
