//! Test fixtures and store setup utilities

use async_trait::async_trait;
use nodestore::model::{
    ActivityId, ActivityKind, ActivityRecord, AuditEvent, BinaryValue, CommitResult, DynamicData,
    NewActivity, NodeHead, NodeHeadData, NodeId, NodeSnapshot, NodeVersionInfo, PropertyValue,
    RunningState, SaveSettings, SchemaData, TreeLockId, VersionData, VersionId, VersionNumber,
};
use nodestore::traits::backend::ExecutableActivities;
use nodestore::{
    BackendError, CancelToken, DataStore, DataStoreConfig, InMemoryBackend, StorageBackend,
    VersionCache,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

static TRACING: Once = Once::new();

/// Route store logs to the test writer, filtered by `RUST_LOG`
fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Store over a fresh in-memory backend with the default cache
pub fn test_store() -> DataStore {
    init_tracing();
    DataStore::with_defaults(Arc::new(InMemoryBackend::new()))
}

/// Store over an instrumented backend that counts version loads
pub fn counting_store() -> (DataStore, Arc<CountingBackend>) {
    init_tracing();
    let backend = Arc::new(CountingBackend::new());
    let store = DataStore::new(
        backend.clone(),
        Arc::new(VersionCache::new()),
        DataStoreConfig::default(),
    );
    (store, backend)
}

/// Save a fresh item carrying one display-name property
pub async fn saved_item(store: &DataStore, path: &str) -> (NodeSnapshot, SaveSettings) {
    let mut snapshot = NodeSnapshot::new_item(NodeId(1), path, 1);
    snapshot.set_property(
        "DisplayName",
        PropertyValue::String(path.rsplit('/').next().unwrap().to_string()),
    );
    let mut settings = SaveSettings::new_version(VersionId::UNASSIGNED);
    store
        .save_node(&mut snapshot, &mut settings, &CancelToken::new())
        .await
        .expect("save failed");
    (snapshot, settings)
}

/// Indexing activity for a committed snapshot
pub fn activity_for(kind: ActivityKind, snapshot: &NodeSnapshot) -> NewActivity {
    NewActivity {
        kind,
        node_id: snapshot.id,
        version_id: snapshot.version_id,
        path: snapshot.path.clone(),
        payload: serde_json::json!({ "path": snapshot.path }).to_string(),
    }
}

/// Backend wrapper counting batched version loads
///
/// Everything delegates to an inner [`InMemoryBackend`]; `load_versions`
/// additionally records the number of calls and the total ids requested, so
/// tests can assert the N-M coalescing property of the bulk loader.
pub struct CountingBackend {
    inner: InMemoryBackend,
    version_load_calls: AtomicUsize,
    version_ids_requested: AtomicUsize,
}

impl CountingBackend {
    pub fn new() -> Self {
        Self {
            inner: InMemoryBackend::new(),
            version_load_calls: AtomicUsize::new(0),
            version_ids_requested: AtomicUsize::new(0),
        }
    }

    pub fn version_load_calls(&self) -> usize {
        self.version_load_calls.load(Ordering::SeqCst)
    }

    pub fn version_ids_requested(&self) -> usize {
        self.version_ids_requested.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageBackend for CountingBackend {
    async fn insert_node(
        &self,
        head: NodeHeadData,
        version: VersionData,
        dynamic: DynamicData,
    ) -> Result<CommitResult, BackendError> {
        self.inner.insert_node(head, version, dynamic).await
    }

    async fn update_node(
        &self,
        head: NodeHeadData,
        version: VersionData,
        dynamic: DynamicData,
        delete_versions: Vec<VersionId>,
        old_path: Option<String>,
    ) -> Result<CommitResult, BackendError> {
        self.inner
            .update_node(head, version, dynamic, delete_versions, old_path)
            .await
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
        self.inner
            .copy_and_update_node(
                head,
                version,
                dynamic,
                delete_versions,
                source_version,
                target_version,
                old_path,
            )
            .await
    }

    async fn update_node_head(
        &self,
        head: NodeHeadData,
        delete_versions: Vec<VersionId>,
    ) -> Result<CommitResult, BackendError> {
        self.inner.update_node_head(head, delete_versions).await
    }

    async fn delete_node(&self, head: NodeHeadData) -> Result<(), BackendError> {
        self.inner.delete_node(head).await
    }

    async fn move_node(
        &self,
        source: NodeHeadData,
        target_node_id: NodeId,
        target_timestamp: u64,
    ) -> Result<u64, BackendError> {
        self.inner
            .move_node(source, target_node_id, target_timestamp)
            .await
    }

    async fn load_versions(
        &self,
        version_ids: Vec<VersionId>,
    ) -> Result<Vec<NodeSnapshot>, BackendError> {
        self.version_load_calls.fetch_add(1, Ordering::SeqCst);
        self.version_ids_requested
            .fetch_add(version_ids.len(), Ordering::SeqCst);
        self.inner.load_versions(version_ids).await
    }

    async fn load_node_head_by_path(&self, path: &str) -> Result<Option<NodeHead>, BackendError> {
        self.inner.load_node_head_by_path(path).await
    }

    async fn load_node_head(&self, node_id: NodeId) -> Result<Option<NodeHead>, BackendError> {
        self.inner.load_node_head(node_id).await
    }

    async fn load_node_head_by_version(
        &self,
        version_id: VersionId,
    ) -> Result<Option<NodeHead>, BackendError> {
        self.inner.load_node_head_by_version(version_id).await
    }

    async fn load_node_heads(&self, node_ids: Vec<NodeId>) -> Result<Vec<NodeHead>, BackendError> {
        self.inner.load_node_heads(node_ids).await
    }

    async fn node_versions(&self, node_id: NodeId) -> Result<Vec<NodeVersionInfo>, BackendError> {
        self.inner.node_versions(node_id).await
    }

    async fn version_numbers(&self, node_id: NodeId) -> Result<Vec<VersionNumber>, BackendError> {
        self.inner.version_numbers(node_id).await
    }

    async fn node_exists(&self, path: &str) -> Result<bool, BackendError> {
        self.inner.node_exists(path).await
    }

    async fn load_text_properties(
        &self,
        version_id: VersionId,
        names: Vec<String>,
    ) -> Result<BTreeMap<String, String>, BackendError> {
        self.inner.load_text_properties(version_id, names).await
    }

    async fn load_binary_property(
        &self,
        version_id: VersionId,
        name: &str,
    ) -> Result<Option<BinaryValue>, BackendError> {
        self.inner.load_binary_property(version_id, name).await
    }

    async fn acquire_tree_lock(&self, path: &str) -> Result<TreeLockId, BackendError> {
        self.inner.acquire_tree_lock(path).await
    }

    async fn is_tree_locked(&self, path: &str) -> Result<bool, BackendError> {
        self.inner.is_tree_locked(path).await
    }

    async fn release_tree_locks(&self, lock_ids: Vec<TreeLockId>) -> Result<(), BackendError> {
        self.inner.release_tree_locks(lock_ids).await
    }

    async fn load_all_tree_locks(&self) -> Result<BTreeMap<TreeLockId, String>, BackendError> {
        self.inner.load_all_tree_locks().await
    }

    async fn append_activity(&self, activity: NewActivity) -> Result<ActivityId, BackendError> {
        self.inner.append_activity(activity).await
    }

    async fn load_activities(
        &self,
        from: ActivityId,
        to: ActivityId,
        max_count: usize,
        lease: Duration,
    ) -> Result<Vec<ActivityRecord>, BackendError> {
        self.inner.load_activities(from, to, max_count, lease).await
    }

    async fn load_activity_gaps(
        &self,
        gaps: Vec<ActivityId>,
        lease: Duration,
    ) -> Result<Vec<ActivityRecord>, BackendError> {
        self.inner.load_activity_gaps(gaps, lease).await
    }

    async fn load_executable_activities(
        &self,
        max_count: usize,
        running_timeout: Duration,
    ) -> Result<ExecutableActivities, BackendError> {
        self.inner
            .load_executable_activities(max_count, running_timeout)
            .await
    }

    async fn set_activity_state(
        &self,
        id: ActivityId,
        state: RunningState,
    ) -> Result<(), BackendError> {
        self.inner.set_activity_state(id, state).await
    }

    async fn refresh_activity_lease(&self, ids: Vec<ActivityId>) -> Result<(), BackendError> {
        self.inner.refresh_activity_lease(ids).await
    }

    async fn delete_finished_activities(&self) -> Result<u64, BackendError> {
        self.inner.delete_finished_activities().await
    }

    async fn delete_all_activities(&self) -> Result<(), BackendError> {
        self.inner.delete_all_activities().await
    }

    async fn last_activity_id(&self) -> Result<ActivityId, BackendError> {
        self.inner.last_activity_id().await
    }

    async fn load_schema(&self) -> Result<SchemaData, BackendError> {
        self.inner.load_schema().await
    }

    async fn start_schema_update(&self, schema_timestamp: u64) -> Result<String, BackendError> {
        self.inner.start_schema_update(schema_timestamp).await
    }

    async fn finish_schema_update(&self, lock_token: &str) -> Result<u64, BackendError> {
        self.inner.finish_schema_update(lock_token).await
    }

    async fn write_audit_event(&self, event: AuditEvent) -> Result<(), BackendError> {
        self.inner.write_audit_event(event).await
    }

    async fn node_count(&self, path: Option<&str>) -> Result<u64, BackendError> {
        self.inner.node_count(path).await
    }

    async fn version_count(&self, path: Option<&str>) -> Result<u64, BackendError> {
        self.inner.version_count(path).await
    }

    async fn tree_size(&self, path: &str, include_children: bool) -> Result<u64, BackendError> {
        self.inner.tree_size(path, include_children).await
    }

    async fn node_timestamp(&self, node_id: NodeId) -> Result<u64, BackendError> {
        self.inner.node_timestamp(node_id).await
    }

    async fn version_timestamp(&self, version_id: VersionId) -> Result<u64, BackendError> {
        self.inner.version_timestamp(version_id).await
    }
}
