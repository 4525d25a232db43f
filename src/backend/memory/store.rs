//! In-memory backend core: dataset and shared helpers

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::BackendError;
use crate::model::activity::ActivityRecord;
use crate::model::audit::AuditEvent;
use crate::model::ids::{ActivityId, NodeId, TreeLockId, VersionId};
use crate::model::node::NodeHead;
use crate::model::property::{BinaryValue, PropertyValue};
use crate::model::schema::SchemaData;
use crate::model::version::VersionNumber;

/// One stored version row
#[derive(Debug, Clone)]
pub(super) struct VersionRow {
    pub node_id: NodeId,
    pub number: VersionNumber,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub timestamp: u64,
    pub properties: BTreeMap<String, PropertyValue>,
    pub binaries: BTreeMap<String, BinaryValue>,
}

/// One active tree lock
#[derive(Debug, Clone)]
pub(super) struct TreeLockRow {
    pub path: String,
    #[allow(dead_code)]
    pub acquired_at: DateTime<Utc>,
}

/// Schema blob plus the experimental update lock
#[derive(Debug)]
pub(super) struct SchemaRow {
    pub data: SchemaData,
    pub lock_token: Option<String>,
}

/// The whole dataset, guarded by one mutex
///
/// Serializing every operation through the mutex is what gives this backend
/// the atomic per-node commit the orchestration layer assumes.
#[derive(Debug)]
pub(super) struct Dataset {
    pub nodes: BTreeMap<NodeId, NodeHead>,
    pub versions: BTreeMap<VersionId, VersionRow>,
    pub tree_locks: BTreeMap<TreeLockId, TreeLockRow>,
    pub activities: BTreeMap<ActivityId, ActivityRecord>,
    pub schema: SchemaRow,
    pub audit_log: Vec<AuditEvent>,

    pub next_node_id: u32,
    pub next_version_id: u32,
    pub next_binary_id: u32,
    pub next_lock_id: u32,
    pub next_activity_id: u64,

    /// Global monotonic commit counter backing every timestamp token
    pub timestamp_counter: u64,
}

impl Dataset {
    fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            versions: BTreeMap::new(),
            tree_locks: BTreeMap::new(),
            activities: BTreeMap::new(),
            schema: SchemaRow {
                data: SchemaData::empty(),
                lock_token: None,
            },
            audit_log: Vec::new(),
            next_node_id: 1,
            next_version_id: 1,
            next_binary_id: 1,
            next_lock_id: 1,
            next_activity_id: 1,
            timestamp_counter: 0,
        }
    }

    pub fn next_timestamp(&mut self) -> u64 {
        self.timestamp_counter += 1;
        self.timestamp_counter
    }

    pub fn take_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    pub fn take_version_id(&mut self) -> VersionId {
        let id = VersionId(self.next_version_id);
        self.next_version_id += 1;
        id
    }

    pub fn take_lock_id(&mut self) -> TreeLockId {
        let id = TreeLockId(self.next_lock_id);
        self.next_lock_id += 1;
        id
    }

    pub fn take_activity_id(&mut self) -> ActivityId {
        let id = ActivityId(self.next_activity_id);
        self.next_activity_id += 1;
        id
    }

    /// Recompute a head's last-major and last-minor version pointers from
    /// its stored versions
    pub fn last_versions_of(&self, node_id: NodeId) -> (VersionId, VersionId) {
        let mut last_major = (VersionId::UNASSIGNED, VersionNumber::new(0, 0));
        let mut last_minor = (VersionId::UNASSIGNED, VersionNumber::new(0, 0));
        for (version_id, row) in &self.versions {
            if row.node_id != node_id {
                continue;
            }
            if !last_minor.0.is_assigned() || row.number >= last_minor.1 {
                last_minor = (*version_id, row.number);
            }
            if row.number.is_major() && (!last_major.0.is_assigned() || row.number >= last_major.1)
            {
                last_major = (*version_id, row.number);
            }
        }
        (last_major.0, last_minor.0)
    }

    /// Stamp binary slots the way a durable engine would: assign ids and
    /// fill in SHA-256 checksums
    pub fn seal_binaries(&mut self, binaries: &mut BTreeMap<String, BinaryValue>) {
        use sha2::Digest;
        for binary in binaries.values_mut() {
            if binary.id == 0 {
                binary.id = self.next_binary_id;
                self.next_binary_id += 1;
            }
            binary.size = binary.data.len() as u64;
            binary.checksum = hex::encode(sha2::Sha256::digest(&binary.data));
        }
    }
}

/// Thread-safe, non-durable reference implementation of the backend contract
///
/// Used by the crate's tests and by embedders for prototyping; it enforces
/// the backend-side invariants the orchestration layer relies on (atomic
/// per-node commit, optimistic-concurrency tokens, tree-lock antichain,
/// monotonic activity ids, lease-guarded claims) without persisting
/// anything.
#[derive(Debug, Clone)]
pub struct InMemoryBackend {
    pub(super) data: Arc<Mutex<Dataset>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(Dataset::new())),
        }
    }

    pub(super) fn dataset(&self) -> Result<MutexGuard<'_, Dataset>, BackendError> {
        self.data
            .lock()
            .map_err(|_| BackendError::Connection("lock poisoned".into()))
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}
