//! In-memory reference backend
//!
//! A complete, thread-safe, non-durable implementation of the backend
//! contract. The trait impl delegates to per-concern `_impl` methods; the
//! synchronous bodies run under one dataset mutex, which is exactly the
//! atomic per-node commit the orchestration layer assumes of any backend.

mod activity;
mod nodes;
mod schema;
mod store;
mod tree_lock;

pub use store::InMemoryBackend;

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
use crate::traits::backend::{ExecutableActivities, StorageBackend};

#[async_trait]
impl StorageBackend for InMemoryBackend {
    async fn insert_node(
        &self,
        head: NodeHeadData,
        version: VersionData,
        dynamic: DynamicData,
    ) -> Result<CommitResult, BackendError> {
        self.insert_node_impl(head, version, dynamic)
    }

    async fn update_node(
        &self,
        head: NodeHeadData,
        version: VersionData,
        dynamic: DynamicData,
        delete_versions: Vec<VersionId>,
        old_path: Option<String>,
    ) -> Result<CommitResult, BackendError> {
        self.update_node_impl(head, version, dynamic, delete_versions, old_path)
    }

    async fn copy_and_update_node(
        &self,
        head: NodeHeadData,
        version: VersionData,
        dynamic: DynamicData,
        delete_versions: Vec<VersionId>,
        source_version: VersionId,
        target_version: Option<VersionId>,
        old_path: Option<String>,
    ) -> Result<CommitResult, BackendError> {
        self.copy_and_update_node_impl(
            head,
            version,
            dynamic,
            delete_versions,
            source_version,
            target_version,
            old_path,
        )
    }

    async fn update_node_head(
        &self,
        head: NodeHeadData,
        delete_versions: Vec<VersionId>,
    ) -> Result<CommitResult, BackendError> {
        self.update_node_head_impl(head, delete_versions)
    }

    async fn delete_node(&self, head: NodeHeadData) -> Result<(), BackendError> {
        self.delete_node_impl(head)
    }

    async fn move_node(
        &self,
        source: NodeHeadData,
        target_node_id: NodeId,
        target_timestamp: u64,
    ) -> Result<u64, BackendError> {
        self.move_node_impl(source, target_node_id, target_timestamp)
    }

    async fn load_versions(
        &self,
        version_ids: Vec<VersionId>,
    ) -> Result<Vec<NodeSnapshot>, BackendError> {
        self.load_versions_impl(version_ids)
    }

    async fn load_node_head_by_path(
        &self,
        path: &str,
    ) -> Result<Option<NodeHead>, BackendError> {
        self.load_node_head_by_path_impl(path)
    }

    async fn load_node_head(&self, node_id: NodeId) -> Result<Option<NodeHead>, BackendError> {
        self.load_node_head_impl(node_id)
    }

    async fn load_node_head_by_version(
        &self,
        version_id: VersionId,
    ) -> Result<Option<NodeHead>, BackendError> {
        self.load_node_head_by_version_impl(version_id)
    }

    async fn load_node_heads(
        &self,
        node_ids: Vec<NodeId>,
    ) -> Result<Vec<NodeHead>, BackendError> {
        self.load_node_heads_impl(node_ids)
    }

    async fn node_versions(
        &self,
        node_id: NodeId,
    ) -> Result<Vec<NodeVersionInfo>, BackendError> {
        self.node_versions_impl(node_id)
    }

    async fn version_numbers(
        &self,
        node_id: NodeId,
    ) -> Result<Vec<VersionNumber>, BackendError> {
        self.version_numbers_impl(node_id)
    }

    async fn node_exists(&self, path: &str) -> Result<bool, BackendError> {
        self.node_exists_impl(path)
    }

    async fn load_text_properties(
        &self,
        version_id: VersionId,
        names: Vec<String>,
    ) -> Result<BTreeMap<String, String>, BackendError> {
        self.load_text_properties_impl(version_id, names)
    }

    async fn load_binary_property(
        &self,
        version_id: VersionId,
        name: &str,
    ) -> Result<Option<BinaryValue>, BackendError> {
        self.load_binary_property_impl(version_id, name)
    }

    async fn acquire_tree_lock(&self, path: &str) -> Result<TreeLockId, BackendError> {
        self.acquire_tree_lock_impl(path)
    }

    async fn is_tree_locked(&self, path: &str) -> Result<bool, BackendError> {
        self.is_tree_locked_impl(path)
    }

    async fn release_tree_locks(&self, lock_ids: Vec<TreeLockId>) -> Result<(), BackendError> {
        self.release_tree_locks_impl(lock_ids)
    }

    async fn load_all_tree_locks(
        &self,
    ) -> Result<BTreeMap<TreeLockId, String>, BackendError> {
        self.load_all_tree_locks_impl()
    }

    async fn append_activity(
        &self,
        activity: NewActivity,
    ) -> Result<ActivityId, BackendError> {
        self.append_activity_impl(activity)
    }

    async fn load_activities(
        &self,
        from: ActivityId,
        to: ActivityId,
        max_count: usize,
        lease: Duration,
    ) -> Result<Vec<ActivityRecord>, BackendError> {
        self.load_activities_impl(from, to, max_count, lease)
    }

    async fn load_activity_gaps(
        &self,
        gaps: Vec<ActivityId>,
        lease: Duration,
    ) -> Result<Vec<ActivityRecord>, BackendError> {
        self.load_activity_gaps_impl(gaps, lease)
    }

    async fn load_executable_activities(
        &self,
        max_count: usize,
        running_timeout: Duration,
    ) -> Result<ExecutableActivities, BackendError> {
        self.load_executable_activities_impl(max_count, running_timeout)
    }

    async fn set_activity_state(
        &self,
        id: ActivityId,
        state: RunningState,
    ) -> Result<(), BackendError> {
        self.set_activity_state_impl(id, state)
    }

    async fn refresh_activity_lease(&self, ids: Vec<ActivityId>) -> Result<(), BackendError> {
        self.refresh_activity_lease_impl(ids)
    }

    async fn delete_finished_activities(&self) -> Result<u64, BackendError> {
        self.delete_finished_activities_impl()
    }

    async fn delete_all_activities(&self) -> Result<(), BackendError> {
        self.delete_all_activities_impl()
    }

    async fn last_activity_id(&self) -> Result<ActivityId, BackendError> {
        self.last_activity_id_impl()
    }

    async fn load_schema(&self) -> Result<SchemaData, BackendError> {
        self.load_schema_impl()
    }

    async fn start_schema_update(
        &self,
        schema_timestamp: u64,
    ) -> Result<String, BackendError> {
        self.start_schema_update_impl(schema_timestamp)
    }

    async fn finish_schema_update(&self, lock_token: &str) -> Result<u64, BackendError> {
        self.finish_schema_update_impl(lock_token)
    }

    async fn write_audit_event(&self, event: AuditEvent) -> Result<(), BackendError> {
        self.write_audit_event_impl(event)
    }

    async fn node_count(&self, path: Option<&str>) -> Result<u64, BackendError> {
        self.node_count_impl(path)
    }

    async fn version_count(&self, path: Option<&str>) -> Result<u64, BackendError> {
        self.version_count_impl(path)
    }

    async fn tree_size(
        &self,
        path: &str,
        include_children: bool,
    ) -> Result<u64, BackendError> {
        self.tree_size_impl(path, include_children)
    }

    async fn node_timestamp(&self, node_id: NodeId) -> Result<u64, BackendError> {
        self.node_timestamp_impl(node_id)
    }

    async fn version_timestamp(&self, version_id: VersionId) -> Result<u64, BackendError> {
        self.version_timestamp_impl(version_id)
    }
}
