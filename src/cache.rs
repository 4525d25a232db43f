//! Dependency-invalidated read cache for hot version snapshots
//!
//! Keyed by version id; each entry is tied to its owning node, so one commit
//! to a node evicts every cached version of it. There is no expiry beyond
//! dependency invalidation, and no caller may rely on a hit.

use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::model::ids::{NodeId, VersionId};
use crate::model::path;
use crate::model::snapshot::NodeSnapshot;
use crate::traits::cache::SnapshotCache;

/// Per-node dependency record
#[derive(Debug, Default)]
struct NodeDependency {
    /// Version ids currently cached for this node
    members: BTreeSet<VersionId>,

    /// Last committed path, for subtree invalidation
    path: String,

    /// Timestamp floor: a snapshot whose node timestamp is below it lost a
    /// race against an invalidation and is dropped on insert
    floor: u64,
}

/// Cache traffic counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Concurrent in-process implementation of [`SnapshotCache`]
///
/// Concurrent inserts of the same version id may race; last-write-wins is
/// harmless because committed versions are immutable.
#[derive(Debug, Default)]
pub struct VersionCache {
    snapshots: DashMap<VersionId, Arc<NodeSnapshot>>,
    nodes: DashMap<NodeId, NodeDependency>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl VersionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    fn evict_members(&self, members: BTreeSet<VersionId>) {
        for version_id in members {
            if self.snapshots.remove(&version_id).is_some() {
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

impl SnapshotCache for VersionCache {
    fn get(&self, version_id: VersionId) -> Option<Arc<NodeSnapshot>> {
        match self.snapshots.get(&version_id) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value().clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn insert(&self, snapshot: Arc<NodeSnapshot>) {
        if !snapshot.id.is_assigned() || !snapshot.version_id.is_assigned() {
            return;
        }
        let mut node = self.nodes.entry(snapshot.id).or_default();
        if snapshot.node_timestamp < node.floor {
            // Stale snapshot racing an invalidation
            tracing::debug!(
                node_id = %snapshot.id,
                version_id = %snapshot.version_id,
                timestamp = snapshot.node_timestamp,
                floor = node.floor,
                "dropping stale snapshot below invalidation floor"
            );
            return;
        }
        node.members.insert(snapshot.version_id);
        node.path = snapshot.path.clone();
        drop(node);
        self.snapshots.insert(snapshot.version_id, snapshot);
    }

    fn invalidate_node(&self, node_id: NodeId, timestamp: u64) {
        let members = {
            let mut node = self.nodes.entry(node_id).or_default();
            if timestamp > node.floor {
                node.floor = timestamp;
            }
            std::mem::take(&mut node.members)
        };
        self.evict_members(members);
    }

    fn invalidate_subtree(&self, subtree_path: &str) {
        let affected: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|entry| path::is_ancestor_or_self(subtree_path, &entry.value().path))
            .map(|entry| *entry.key())
            .collect();
        for node_id in affected {
            let members = self
                .nodes
                .get_mut(&node_id)
                .map(|mut node| std::mem::take(&mut node.members))
                .unwrap_or_default();
            self.evict_members(members);
        }
    }

    fn clear(&self) {
        self.snapshots.clear();
        self.nodes.clear();
    }
}

/// Cache that never stores anything
///
/// Proves the best-effort contract: the layer must behave identically when
/// every lookup misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSnapshotCache;

impl SnapshotCache for NullSnapshotCache {
    fn get(&self, _version_id: VersionId) -> Option<Arc<NodeSnapshot>> {
        None
    }

    fn insert(&self, _snapshot: Arc<NodeSnapshot>) {}

    fn invalidate_node(&self, _node_id: NodeId, _timestamp: u64) {}

    fn invalidate_subtree(&self, _path: &str) {}

    fn clear(&self) {}
}
