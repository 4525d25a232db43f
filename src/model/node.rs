//! Node head records
//!
//! The head is the mutable face of a content item: its current location and
//! pointers to its latest versions. `NodeHead` is the read model returned by
//! head queries; `NodeHeadData` is the write model a commit sends, with the
//! timestamp acting as the expected-before optimistic-concurrency token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{NodeId, VersionId};

/// Read model of a node head record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeHead {
    pub id: NodeId,
    pub parent_id: NodeId,
    pub path: String,
    pub name: String,
    pub node_type_id: u32,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    /// Latest public (major) version, unassigned when none exists
    pub last_major_version_id: VersionId,
    /// Latest version of any kind
    pub last_minor_version_id: VersionId,
    /// Monotonic token advanced by every commit; doubles as the
    /// cache-invalidation dependency stamp
    pub timestamp: u64,
}

/// Write model of a node head, passed to the backend on commit
#[derive(Debug, Clone, PartialEq)]
pub struct NodeHeadData {
    pub node_id: NodeId,
    pub parent_id: NodeId,
    pub path: String,
    pub name: String,
    pub node_type_id: u32,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub last_major_version_id: VersionId,
    pub last_minor_version_id: VersionId,
    /// Expected-before token; the backend rejects the commit as out of date
    /// when the stored head has moved past it
    pub timestamp: u64,
}

/// Write-back values returned by every node commit
///
/// Head-only commits (no version data persisted) return zeroed version
/// fields; the orchestrator applies version write-backs only on paths that
/// persisted a version.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CommitResult {
    pub node_id: NodeId,
    pub version_id: VersionId,
    pub node_timestamp: u64,
    pub version_timestamp: u64,
    pub last_major_version_id: VersionId,
    pub last_minor_version_id: VersionId,
}
