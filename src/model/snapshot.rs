//! Editable node snapshots and load tokens

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::ids::{NodeId, VersionId};
use super::node::{NodeHead, NodeHeadData};
use super::path;
use super::property::{BinaryValue, DynamicData, PropertyValue};
use super::version::{VersionData, VersionNumber};

/// Editable working copy of one node version
///
/// A snapshot is what `save_node` commits: head fields, version fields and
/// the dynamic property set, with per-slot change tracking so in-place
/// updates send only what actually changed. The previously committed path is
/// kept for rename detection; a fresh snapshot has none.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub parent_id: NodeId,
    pub path: String,
    pub name: String,
    pub node_type_id: u32,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub version_id: VersionId,
    pub version: VersionNumber,
    pub last_major_version_id: VersionId,
    pub last_minor_version_id: VersionId,
    /// Head optimistic-concurrency token (expected-before on commit)
    pub node_timestamp: u64,
    /// Version row token
    pub version_timestamp: u64,

    properties: BTreeMap<String, PropertyValue>,
    binaries: BTreeMap<String, BinaryValue>,
    changed: BTreeSet<String>,
    original_path: Option<String>,
}

impl NodeSnapshot {
    /// Working copy for a content item that has never been persisted
    ///
    /// The backend assigns the node and version ids on the first commit.
    pub fn new_item(parent_id: NodeId, node_path: impl Into<String>, node_type_id: u32) -> Self {
        let node_path = node_path.into();
        let name = path::name(&node_path).to_string();
        let now = Utc::now();
        Self {
            id: NodeId::UNASSIGNED,
            parent_id,
            path: node_path,
            name,
            node_type_id,
            created_at: now,
            modified_at: now,
            version_id: VersionId::UNASSIGNED,
            version: VersionNumber::first(),
            last_major_version_id: VersionId::UNASSIGNED,
            last_minor_version_id: VersionId::UNASSIGNED,
            node_timestamp: 0,
            version_timestamp: 0,
            properties: BTreeMap::new(),
            binaries: BTreeMap::new(),
            changed: BTreeSet::new(),
            original_path: None,
        }
    }

    /// Snapshot rebuilt from persisted state (backends use this when
    /// answering version loads)
    ///
    /// Change tracking starts clean and the committed path is recorded for
    /// rename detection.
    #[allow(clippy::too_many_arguments)]
    pub fn loaded(
        head: &NodeHead,
        version_id: VersionId,
        version: VersionNumber,
        version_timestamp: u64,
        properties: BTreeMap<String, PropertyValue>,
        binaries: BTreeMap<String, BinaryValue>,
    ) -> Self {
        Self {
            id: head.id,
            parent_id: head.parent_id,
            path: head.path.clone(),
            name: head.name.clone(),
            node_type_id: head.node_type_id,
            created_at: head.created_at,
            modified_at: head.modified_at,
            version_id,
            version,
            last_major_version_id: head.last_major_version_id,
            last_minor_version_id: head.last_minor_version_id,
            node_timestamp: head.timestamp,
            version_timestamp,
            properties,
            binaries,
            changed: BTreeSet::new(),
            original_path: Some(head.path.clone()),
        }
    }

    // ========== Dynamic data ==========

    /// Set a dynamic property and mark the slot changed
    pub fn set_property(&mut self, slot: impl Into<String>, value: PropertyValue) {
        let slot = slot.into();
        self.changed.insert(slot.clone());
        self.properties.insert(slot, value);
    }

    /// Set a binary slot and mark it changed
    pub fn set_binary(&mut self, slot: impl Into<String>, value: BinaryValue) {
        let slot = slot.into();
        self.changed.insert(slot.clone());
        self.binaries.insert(slot, value);
    }

    pub fn property(&self, slot: &str) -> Option<&PropertyValue> {
        self.properties.get(slot)
    }

    pub fn binary(&self, slot: &str) -> Option<&BinaryValue> {
        self.binaries.get(slot)
    }

    pub fn properties(&self) -> &BTreeMap<String, PropertyValue> {
        &self.properties
    }

    pub fn binaries(&self) -> &BTreeMap<String, BinaryValue> {
        &self.binaries
    }

    /// True when any dynamic slot changed since load/commit
    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }

    // ========== Rename detection ==========

    /// The last committed path, if this snapshot was ever persisted
    pub fn original_path(&self) -> Option<&str> {
        self.original_path.as_deref()
    }

    /// True when the path moved away from its last committed value
    pub fn path_changed(&self) -> bool {
        match &self.original_path {
            Some(original) => original != &self.path,
            None => false,
        }
    }

    // ========== Write models ==========

    /// Head write model with this snapshot's token as expected-before
    pub fn head_data(&self) -> NodeHeadData {
        NodeHeadData {
            node_id: self.id,
            parent_id: self.parent_id,
            path: self.path.clone(),
            name: self.name.clone(),
            node_type_id: self.node_type_id,
            created_at: self.created_at,
            modified_at: self.modified_at,
            last_major_version_id: self.last_major_version_id,
            last_minor_version_id: self.last_minor_version_id,
            timestamp: self.node_timestamp,
        }
    }

    /// Version write model
    pub fn version_data(&self) -> VersionData {
        VersionData {
            version_id: self.version_id,
            node_id: self.id,
            number: self.version,
            created_at: self.created_at,
            modified_at: self.modified_at,
            timestamp: self.version_timestamp,
        }
    }

    /// Dynamic data to persist: the full slot set when `all` is true (copy
    /// strategies), only the changed slots otherwise
    pub fn dynamic_data(&self, all: bool) -> DynamicData {
        if all {
            return DynamicData {
                properties: self.properties.clone(),
                binaries: self.binaries.clone(),
            };
        }
        DynamicData {
            properties: self
                .properties
                .iter()
                .filter(|(slot, _)| self.changed.contains(*slot))
                .map(|(slot, value)| (slot.clone(), value.clone()))
                .collect(),
            binaries: self
                .binaries
                .iter()
                .filter(|(slot, _)| self.changed.contains(*slot))
                .map(|(slot, value)| (slot.clone(), value.clone()))
                .collect(),
        }
    }

    /// Reset change tracking after a successful commit; the current path
    /// becomes the committed one
    pub(crate) fn mark_committed(&mut self) {
        self.changed.clear();
        self.original_path = Some(self.path.clone());
    }
}

/// Pairing of a requested (head, version id) with the loaded snapshot
///
/// A token whose snapshot stayed `None` after a bulk load marks a version
/// that vanished between head lookup and version load, a legitimate
/// concurrent-deletion outcome rather than an error.
#[derive(Debug, Clone)]
pub struct NodeToken {
    pub head: NodeHead,
    pub version_id: VersionId,
    pub snapshot: Option<Arc<NodeSnapshot>>,
}

impl NodeToken {
    /// Token awaiting its snapshot
    pub fn pending(head: NodeHead, version_id: VersionId) -> Self {
        Self {
            head,
            version_id,
            snapshot: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.is_some()
    }
}
