//! Tree-lock operations of the in-memory backend
//!
//! The antichain invariant is enforced here, atomically under the dataset
//! mutex: an acquire that would make two active lock paths comparable under
//! prefix ordering is rejected.

use chrono::Utc;
use std::collections::BTreeMap;

use crate::error::BackendError;
use crate::model::ids::TreeLockId;
use crate::model::path;

use super::store::{InMemoryBackend, TreeLockRow};

impl InMemoryBackend {
    pub(super) fn acquire_tree_lock_impl(
        &self,
        lock_path: &str,
    ) -> Result<TreeLockId, BackendError> {
        let mut data = self.dataset()?;
        if data
            .tree_locks
            .values()
            .any(|lock| path::paths_conflict(&lock.path, lock_path))
        {
            return Err(BackendError::PathLocked(lock_path.to_string()));
        }
        let lock_id = data.take_lock_id();
        data.tree_locks.insert(
            lock_id,
            TreeLockRow {
                path: lock_path.to_string(),
                acquired_at: Utc::now(),
            },
        );
        Ok(lock_id)
    }

    pub(super) fn is_tree_locked_impl(&self, lock_path: &str) -> Result<bool, BackendError> {
        let data = self.dataset()?;
        Ok(data
            .tree_locks
            .values()
            .any(|lock| path::paths_conflict(&lock.path, lock_path)))
    }

    pub(super) fn release_tree_locks_impl(
        &self,
        lock_ids: Vec<TreeLockId>,
    ) -> Result<(), BackendError> {
        let mut data = self.dataset()?;
        for lock_id in lock_ids {
            data.tree_locks.remove(&lock_id);
        }
        Ok(())
    }

    pub(super) fn load_all_tree_locks_impl(
        &self,
    ) -> Result<BTreeMap<TreeLockId, String>, BackendError> {
        let data = self.dataset()?;
        Ok(data
            .tree_locks
            .iter()
            .map(|(lock_id, lock)| (*lock_id, lock.path.clone()))
            .collect())
    }
}
