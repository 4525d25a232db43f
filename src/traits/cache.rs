//! Snapshot cache trait definition
//!
//! The cache is best-effort by contract: every caller path must function
//! correctly on an unconditional miss, so implementations are free to drop
//! anything at any time.

use std::sync::Arc;

use crate::model::ids::{NodeId, VersionId};
use crate::model::snapshot::NodeSnapshot;

/// Version-keyed snapshot cache with node-dependency invalidation
pub trait SnapshotCache: Send + Sync + 'static {
    /// Look up a snapshot by its version id
    fn get(&self, version_id: VersionId) -> Option<Arc<NodeSnapshot>>;

    /// Insert under the snapshot's version id, attached to a dependency on
    /// the owning node's identity and timestamp
    fn insert(&self, snapshot: Arc<NodeSnapshot>);

    /// Evict every version cached for the node and raise its timestamp
    /// floor, so stale snapshots racing the invalidation are dropped on
    /// insert
    fn invalidate_node(&self, node_id: NodeId, timestamp: u64);

    /// Evict every version whose node lives at or below the path
    fn invalidate_subtree(&self, path: &str);

    /// Drop everything
    fn clear(&self);
}
