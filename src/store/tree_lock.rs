//! Advisory subtree locks
//!
//! Callers bracket structural operations (move, delete, bulk import) with a
//! tree lock over the affected subtree. Active lock paths form an antichain:
//! no two may be equal or contain one another. The backend enforces that
//! atomically; this surface defines the contract and validates arguments.

use std::collections::BTreeMap;

use crate::error::{DataStoreError, Result};
use crate::model::ids::TreeLockId;
use crate::model::path;

use super::DataStore;

impl DataStore {
    /// Acquire an advisory lock over `lock_path` and its subtree
    ///
    /// Fails with [`DataStoreError::TreeLocked`] when the path equals,
    /// contains or is contained by an actively locked path; callers apply
    /// their own wait/retry policy on that condition.
    pub async fn acquire_tree_lock(&self, lock_path: &str) -> Result<TreeLockId> {
        self.ensure_enabled()?;
        if !path::is_well_formed(lock_path) {
            return Err(DataStoreError::InvalidArgument(format!(
                "malformed path: {lock_path:?}"
            )));
        }
        let lock_id = self.backend().acquire_tree_lock(lock_path).await?;
        tracing::debug!(lock_id = %lock_id, path = %lock_path, "tree lock acquired");
        Ok(lock_id)
    }

    /// Read-only probe over the same conflict predicate as acquire
    pub async fn is_tree_locked(&self, lock_path: &str) -> Result<bool> {
        self.ensure_enabled()?;
        if !path::is_well_formed(lock_path) {
            return Err(DataStoreError::InvalidArgument(format!(
                "malformed path: {lock_path:?}"
            )));
        }
        Ok(self.backend().is_tree_locked(lock_path).await?)
    }

    /// Release a batch of locks; idempotent, unknown ids are ignored
    pub async fn release_tree_locks(&self, lock_ids: Vec<TreeLockId>) -> Result<()> {
        self.ensure_enabled()?;
        if lock_ids.is_empty() {
            return Ok(());
        }
        self.backend().release_tree_locks(lock_ids).await?;
        Ok(())
    }

    /// All active locks, for recovery and diagnostics after a restart
    ///
    /// Locks are durable across restarts; a recovering process lists them to
    /// decide what to release or wait for.
    pub async fn load_all_tree_locks(&self) -> Result<BTreeMap<TreeLockId, String>> {
        self.ensure_enabled()?;
        let locks = self.backend().load_all_tree_locks().await?;
        tracing::info!(count = locks.len(), "loaded active tree locks");
        Ok(locks)
    }
}
