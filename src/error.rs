//! Error types for the persistence-orchestration layer

use thiserror::Error;

/// Errors raised by the injected backend behind the [`StorageBackend`]
/// contract.
///
/// The layer performs no retry and no rollback on these; they propagate to
/// the caller unchanged (wrapped in [`DataStoreError`]), because transactional
/// atomicity is the backend's responsibility.
///
/// [`StorageBackend`]: crate::traits::StorageBackend
#[derive(Debug, Error)]
pub enum BackendError {
    // ========== Connectivity ==========
    /// Backend unreachable or connection state broken
    #[error("backend connection failed: {0}")]
    Connection(String),

    // ========== Write Conflicts ==========
    /// Optimistic-concurrency token mismatch: the record changed since it
    /// was loaded
    #[error("record out of date: {0}")]
    OutOfDate(String),

    /// Uniqueness or referential constraint violated
    #[error("constraint violation: {0}")]
    Constraint(String),

    // ========== Lookups ==========
    /// A record the operation requires does not exist
    #[error("not found: {0}")]
    NotFound(String),

    // ========== Tree Locks ==========
    /// The path equals, contains, or is contained by an actively locked path
    #[error("path is locked: {0}")]
    PathLocked(String),

    // ========== Schema ==========
    /// A schema update lock is already held (or the presented token does not
    /// own it)
    #[error("schema is locked for update")]
    SchemaLocked,

    /// The caller's schema timestamp is stale
    #[error("schema out of date: expected timestamp {expected}, got {actual}")]
    SchemaOutOfDate { expected: u64, actual: u64 },

    // ========== Payloads ==========
    /// Opaque payload could not be serialized or deserialized
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for BackendError {
    fn from(e: serde_json::Error) -> Self {
        BackendError::Serialization(e.to_string())
    }
}

/// Main error type of the orchestration layer
#[derive(Debug, Error)]
pub enum DataStoreError {
    /// The store was constructed with `enabled = false`
    #[error("data store is disabled")]
    Disabled,

    /// Malformed input detected before any I/O was dispatched
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Cooperative cancellation was requested before dispatch
    #[error("operation cancelled")]
    Cancelled,

    /// Tree-lock conflict; distinguishable so callers can apply their own
    /// wait/retry policy
    #[error("tree is locked: {0}")]
    TreeLocked(String),

    /// A node or version the operation requires does not exist
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// Any other backend failure, propagated unchanged
    #[error("backend error: {0}")]
    Backend(BackendError),
}

/// Result type alias for the layer surface
pub type Result<T> = std::result::Result<T, DataStoreError>;

impl From<BackendError> for DataStoreError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::PathLocked(path) => DataStoreError::TreeLocked(path),
            BackendError::NotFound(what) => DataStoreError::NodeNotFound(what),
            other => DataStoreError::Backend(other),
        }
    }
}

impl DataStoreError {
    /// Check for a tree-lock conflict (callers typically wait and retry)
    pub fn is_tree_locked(&self) -> bool {
        matches!(self, DataStoreError::TreeLocked(_))
    }

    /// Check for an optimistic-concurrency mismatch (callers typically
    /// reload and reapply)
    pub fn is_out_of_date(&self) -> bool {
        matches!(self, DataStoreError::Backend(BackendError::OutOfDate(_)))
    }
}
