//! Commit orchestration: save, delete and move
//!
//! `save_node` turns an edited snapshot into exactly one backend commit,
//! chosen by [`SaveStrategy::select`]. The layer adds no retry and no
//! rollback; backend failures propagate unchanged because transactional
//! atomicity is the backend's contract.

use crate::cancel::CancelToken;
use crate::error::{DataStoreError, Result};
use crate::model::ids::NodeId;
use crate::model::node::CommitResult;
use crate::model::path;
use crate::model::save::{SaveSettings, SaveStrategy};
use crate::model::snapshot::NodeSnapshot;

use super::DataStore;

impl DataStore {
    /// Commit an edited snapshot
    ///
    /// Validates arguments and checks the cancellation token before any I/O;
    /// once the backend call has started it is never interrupted, so a
    /// cancel racing dispatch leaves the backend either untouched or fully
    /// committed. The window between dispatch and acknowledgment is the
    /// backend's consistency contract, not this layer's.
    ///
    /// Postconditions on every path: the snapshot's version id and version
    /// timestamp reflect the persisted version (untouched on head-only
    /// commits), the settings carry the head's post-commit last-major and
    /// last-minor version ids, and the snapshot carries the new head
    /// timestamp.
    pub async fn save_node(
        &self,
        snapshot: &mut NodeSnapshot,
        settings: &mut SaveSettings,
        cancel: &CancelToken,
    ) -> Result<()> {
        self.ensure_enabled()?;
        if cancel.is_cancelled() {
            return Err(DataStoreError::Cancelled);
        }
        self.validate_snapshot(snapshot)?;

        let strategy = SaveStrategy::select(snapshot, settings);
        tracing::debug!(
            node_id = %snapshot.id,
            path = %snapshot.path,
            ?strategy,
            needs_version_data = settings.needs_version_data,
            "saving node"
        );

        let result = if settings.needs_version_data {
            self.dispatch_strategy(snapshot, settings, strategy).await?
        } else {
            if !snapshot.id.is_assigned() {
                return Err(DataStoreError::InvalidArgument(
                    "head-only save of a never-persisted node".into(),
                ));
            }
            self.backend()
                .update_node_head(snapshot.head_data(), settings.deletable_version_ids.clone())
                .await?
        };

        // Write back version-level values only when a version was persisted
        if settings.needs_version_data {
            snapshot.version_id = result.version_id;
            snapshot.version_timestamp = result.version_timestamp;
        }
        if matches!(strategy, SaveStrategy::CreateNew) {
            snapshot.id = result.node_id;
        }
        settings.last_major_version_id_after = result.last_major_version_id;
        settings.last_minor_version_id_after = result.last_minor_version_id;
        snapshot.node_timestamp = result.node_timestamp;

        self.cache()
            .invalidate_node(snapshot.id, result.node_timestamp);
        snapshot.mark_committed();
        Ok(())
    }

    async fn dispatch_strategy(
        &self,
        snapshot: &NodeSnapshot,
        settings: &SaveSettings,
        strategy: SaveStrategy,
    ) -> Result<CommitResult> {
        let head = snapshot.head_data();
        let version = snapshot.version_data();
        let old_path = |renamed: bool| {
            renamed
                .then(|| snapshot.original_path().map(str::to_string))
                .flatten()
        };

        let result = match strategy {
            SaveStrategy::CreateNew => {
                self.backend()
                    .insert_node(head, version, snapshot.dynamic_data(false))
                    .await?
            }
            SaveStrategy::UpdateInPlace { renamed } => {
                self.backend()
                    .update_node(
                        head,
                        version,
                        snapshot.dynamic_data(false),
                        settings.deletable_version_ids.clone(),
                        old_path(renamed),
                    )
                    .await?
            }
            SaveStrategy::CopyToNewVersion { renamed } => {
                self.backend()
                    .copy_and_update_node(
                        head,
                        version,
                        snapshot.dynamic_data(true),
                        settings.deletable_version_ids.clone(),
                        settings.current_version_id,
                        None,
                        old_path(renamed),
                    )
                    .await?
            }
            SaveStrategy::CopyToVersion { target, renamed } => {
                self.backend()
                    .copy_and_update_node(
                        head,
                        version,
                        snapshot.dynamic_data(true),
                        settings.deletable_version_ids.clone(),
                        settings.current_version_id,
                        Some(target),
                        old_path(renamed),
                    )
                    .await?
            }
        };
        Ok(result)
    }

    /// Delete a node and its whole subtree
    pub async fn delete_node(&self, snapshot: &NodeSnapshot) -> Result<()> {
        self.ensure_enabled()?;
        if !snapshot.id.is_assigned() {
            return Err(DataStoreError::InvalidArgument(
                "cannot delete a never-persisted node".into(),
            ));
        }
        tracing::debug!(node_id = %snapshot.id, path = %snapshot.path, "deleting node");
        self.backend().delete_node(snapshot.head_data()).await?;

        self.cache().invalidate_node(snapshot.id, u64::MAX);
        self.cache().invalidate_subtree(&snapshot.path);
        Ok(())
    }

    /// Move a node's subtree under a new parent
    ///
    /// `target_timestamp` is the caller's expected token of the target head;
    /// the backend rejects the move when either side moved underneath.
    pub async fn move_node(
        &self,
        snapshot: &mut NodeSnapshot,
        target_node_id: NodeId,
        target_timestamp: u64,
    ) -> Result<()> {
        self.ensure_enabled()?;
        if !snapshot.id.is_assigned() {
            return Err(DataStoreError::InvalidArgument(
                "cannot move a never-persisted node".into(),
            ));
        }
        tracing::debug!(
            node_id = %snapshot.id,
            path = %snapshot.path,
            target = %target_node_id,
            "moving node"
        );
        let new_timestamp = self
            .backend()
            .move_node(snapshot.head_data(), target_node_id, target_timestamp)
            .await?;

        self.cache().invalidate_node(snapshot.id, new_timestamp);
        self.cache().invalidate_subtree(&snapshot.path);
        snapshot.node_timestamp = new_timestamp;
        Ok(())
    }

    fn validate_snapshot(&self, snapshot: &NodeSnapshot) -> Result<()> {
        if !path::is_well_formed(&snapshot.path) {
            return Err(DataStoreError::InvalidArgument(format!(
                "malformed path: {:?}",
                snapshot.path
            )));
        }
        if snapshot.path.len() > self.config().path_max_length {
            return Err(DataStoreError::InvalidArgument(format!(
                "path exceeds {} bytes",
                self.config().path_max_length
            )));
        }
        if snapshot.name.is_empty() {
            return Err(DataStoreError::InvalidArgument("empty node name".into()));
        }
        Ok(())
    }
}
