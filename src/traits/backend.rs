//! Async storage backend trait definition
//!
//! The whole consumed contract of the layer in one object-safe trait, bound
//! once at composition time behind `Arc<dyn StorageBackend>`. The backend
//! owns durability, transactions and row-level locking; every method here is
//! assumed atomic from this layer's point of view.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::BackendError;
use crate::model::activity::{ActivityRecord, NewActivity, RunningState};
use crate::model::audit::AuditEvent;
use crate::model::ids::{ActivityId, NodeId, TreeLockId, VersionId};
use crate::model::node::{CommitResult, NodeHead, NodeHeadData};
use crate::model::property::{BinaryValue, DynamicData};
use crate::model::schema::SchemaData;
use crate::model::snapshot::NodeSnapshot;
use crate::model::version::{NodeVersionInfo, VersionData, VersionNumber};

/// Result of an executable-activity load
#[derive(Debug, Clone, Default)]
pub struct ExecutableActivities {
    /// Activities claimed for immediate execution
    pub executable: Vec<ActivityRecord>,

    /// Ids Running inside an unexpired lease: legitimately owned by another
    /// worker, to be waited on rather than treated as gaps
    pub waiting: Vec<ActivityId>,
}

/// Async storage backend contract
///
/// Errors propagate to the caller unchanged; the layer performs no retry and
/// no rollback on any of them.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    // ========== Node commits ==========

    /// Insert head, first version and dynamic data of a fresh node
    ///
    /// The backend assigns node and version ids and returns them in the
    /// commit result.
    ///
    /// # Errors
    /// * `BackendError::Constraint` - a node already exists at the path
    async fn insert_node(
        &self,
        head: NodeHeadData,
        version: VersionData,
        dynamic: DynamicData,
    ) -> Result<CommitResult, BackendError>;

    /// Update the current version in place and prune `delete_versions`
    ///
    /// `old_path` is present when the commit renames the node; the backend
    /// migrates subtree paths from it.
    ///
    /// # Errors
    /// * `BackendError::OutOfDate` - the head or version token is stale
    async fn update_node(
        &self,
        head: NodeHeadData,
        version: VersionData,
        dynamic: DynamicData,
        delete_versions: Vec<VersionId>,
        old_path: Option<String>,
    ) -> Result<CommitResult, BackendError>;

    /// Copy `source_version` into a new version (or into `target_version`
    /// when given) and apply the update there
    async fn copy_and_update_node(
        &self,
        head: NodeHeadData,
        version: VersionData,
        dynamic: DynamicData,
        delete_versions: Vec<VersionId>,
        source_version: VersionId,
        target_version: Option<VersionId>,
        old_path: Option<String>,
    ) -> Result<CommitResult, BackendError>;

    /// Head-only commit: update head fields and prune, persist no version
    async fn update_node_head(
        &self,
        head: NodeHeadData,
        delete_versions: Vec<VersionId>,
    ) -> Result<CommitResult, BackendError>;

    /// Delete the node and its whole subtree
    ///
    /// # Errors
    /// * `BackendError::OutOfDate` - the head token is stale
    async fn delete_node(&self, head: NodeHeadData) -> Result<(), BackendError>;

    /// Move the node's subtree under `target_node_id`
    ///
    /// Returns the source head's new timestamp token.
    async fn move_node(
        &self,
        source: NodeHeadData,
        target_node_id: NodeId,
        target_timestamp: u64,
    ) -> Result<u64, BackendError>;

    // ========== Version loads ==========

    /// Batched load of version snapshots by id
    ///
    /// Ids with no stored version are simply absent from the result - a
    /// legitimate concurrent-deletion outcome, never an error.
    async fn load_versions(
        &self,
        version_ids: Vec<VersionId>,
    ) -> Result<Vec<NodeSnapshot>, BackendError>;

    /// Load a head by its current path (case-insensitive)
    async fn load_node_head_by_path(&self, path: &str)
        -> Result<Option<NodeHead>, BackendError>;

    /// Load a head by node id
    async fn load_node_head(&self, node_id: NodeId) -> Result<Option<NodeHead>, BackendError>;

    /// Load the head owning a version
    async fn load_node_head_by_version(
        &self,
        version_id: VersionId,
    ) -> Result<Option<NodeHead>, BackendError>;

    /// Batched head load; missing ids are absent from the result
    async fn load_node_heads(
        &self,
        node_ids: Vec<NodeId>,
    ) -> Result<Vec<NodeHead>, BackendError>;

    /// All versions of a node, ordered by version number
    async fn node_versions(&self, node_id: NodeId)
        -> Result<Vec<NodeVersionInfo>, BackendError>;

    /// Version numbers of a node, ordered
    async fn version_numbers(&self, node_id: NodeId)
        -> Result<Vec<VersionNumber>, BackendError>;

    /// Whether a node exists at the path
    async fn node_exists(&self, path: &str) -> Result<bool, BackendError>;

    /// Load named long-text slots of a version without the full snapshot
    async fn load_text_properties(
        &self,
        version_id: VersionId,
        names: Vec<String>,
    ) -> Result<BTreeMap<String, String>, BackendError>;

    /// Load one binary slot of a version
    async fn load_binary_property(
        &self,
        version_id: VersionId,
        name: &str,
    ) -> Result<Option<BinaryValue>, BackendError>;

    // ========== Tree locks ==========

    /// Atomically acquire an advisory lock over the path's subtree
    ///
    /// # Errors
    /// * `BackendError::PathLocked` - the path equals, contains or is
    ///   contained by an actively locked path
    async fn acquire_tree_lock(&self, path: &str) -> Result<TreeLockId, BackendError>;

    /// Read-only conflict probe over the same predicate as acquire
    async fn is_tree_locked(&self, path: &str) -> Result<bool, BackendError>;

    /// Release a batch of locks; unknown ids are ignored
    async fn release_tree_locks(&self, lock_ids: Vec<TreeLockId>) -> Result<(), BackendError>;

    /// All active locks, for recovery and diagnostics after a restart
    async fn load_all_tree_locks(
        &self,
    ) -> Result<BTreeMap<TreeLockId, String>, BackendError>;

    // ========== Indexing activities ==========

    /// Append an activity; the backend assigns the next monotonic id
    async fn append_activity(&self, activity: NewActivity)
        -> Result<ActivityId, BackendError>;

    /// Claim executable activities in `from..=to`, at most `max_count`
    ///
    /// Claimed records transition to Running with a fresh lease stamp.
    /// Records Running inside an unexpired `lease` are skipped; past it they
    /// are treated as abandoned and reclaimed.
    async fn load_activities(
        &self,
        from: ActivityId,
        to: ActivityId,
        max_count: usize,
        lease: Duration,
    ) -> Result<Vec<ActivityRecord>, BackendError>;

    /// Claim specific ids a consumer knows are missing below its watermark
    ///
    /// Done ids and ids Running inside an unexpired lease are filtered out;
    /// missing ids are silently absent.
    async fn load_activity_gaps(
        &self,
        gaps: Vec<ActivityId>,
        lease: Duration,
    ) -> Result<Vec<ActivityRecord>, BackendError>;

    /// Claim ready activities for a worker with no prior watermark
    async fn load_executable_activities(
        &self,
        max_count: usize,
        running_timeout: Duration,
    ) -> Result<ExecutableActivities, BackendError>;

    /// Transition an activity's running state; unknown ids are ignored
    async fn set_activity_state(
        &self,
        id: ActivityId,
        state: RunningState,
    ) -> Result<(), BackendError>;

    /// Re-stamp the lease of ids a worker is still legitimately waiting on
    async fn refresh_activity_lease(&self, ids: Vec<ActivityId>)
        -> Result<(), BackendError>;

    /// Compact Done activities every consumer has passed; returns the count
    /// removed
    async fn delete_finished_activities(&self) -> Result<u64, BackendError>;

    /// Remove every activity and restart id assignment (full reindex)
    async fn delete_all_activities(&self) -> Result<(), BackendError>;

    /// Highest id ever assigned, zero for an empty log
    async fn last_activity_id(&self) -> Result<ActivityId, BackendError>;

    // ========== Schema ==========

    /// Load the schema blob and its change token
    async fn load_schema(&self) -> Result<SchemaData, BackendError>;

    /// Take the exclusive schema update lock
    ///
    /// # Errors
    /// * `BackendError::SchemaOutOfDate` - the presented token is stale
    /// * `BackendError::SchemaLocked` - another update is in progress
    async fn start_schema_update(&self, schema_timestamp: u64)
        -> Result<String, BackendError>;

    /// Release the update lock and bump the schema token
    ///
    /// # Errors
    /// * `BackendError::SchemaLocked` - the presented lock token is not the
    ///   holder
    async fn finish_schema_update(&self, lock_token: &str) -> Result<u64, BackendError>;

    // ========== Audit ==========

    /// Write one audit event
    async fn write_audit_event(&self, event: AuditEvent) -> Result<(), BackendError>;

    // ========== Statistics ==========

    /// Count of nodes, under `path` when given
    async fn node_count(&self, path: Option<&str>) -> Result<u64, BackendError>;

    /// Count of versions, under `path` when given
    async fn version_count(&self, path: Option<&str>) -> Result<u64, BackendError>;

    /// Total binary bytes under a path, optionally including descendants
    async fn tree_size(&self, path: &str, include_children: bool)
        -> Result<u64, BackendError>;

    /// Head timestamp token, zero for an unknown node
    async fn node_timestamp(&self, node_id: NodeId) -> Result<u64, BackendError>;

    /// Version timestamp token, zero for an unknown version
    async fn version_timestamp(&self, version_id: VersionId) -> Result<u64, BackendError>;
}
