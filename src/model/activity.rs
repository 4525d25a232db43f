//! Indexing activity records
//!
//! An activity describes how the search index must change after a commit.
//! The payload is opaque to this layer; consumers rebuild their own activity
//! types from stored records through a factory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ActivityId, NodeId, VersionId};

/// Running state of a stored activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunningState {
    /// Appended, not yet claimed by any worker
    Waiting,
    /// Claimed by a worker; protected by the lease until it expires
    Running,
    /// Applied to the index; compactable
    Done,
}

impl RunningState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunningState::Waiting => "waiting",
            RunningState::Running => "running",
            RunningState::Done => "done",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "waiting" => Some(RunningState::Waiting),
            "running" => Some(RunningState::Running),
            "done" => Some(RunningState::Done),
            _ => None,
        }
    }
}

/// What kind of index change an activity carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityKind {
    /// Index a freshly created version
    AddDocument,
    /// Re-index an updated version
    UpdateDocument,
    /// Index a whole subtree (move target, restore)
    AddTree,
    /// Drop a whole subtree from the index (delete, move source)
    RemoveTree,
    /// Full rebuild marker
    Rebuild,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::AddDocument => "add_document",
            ActivityKind::UpdateDocument => "update_document",
            ActivityKind::AddTree => "add_tree",
            ActivityKind::RemoveTree => "remove_tree",
            ActivityKind::Rebuild => "rebuild",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "add_document" => Some(ActivityKind::AddDocument),
            "update_document" => Some(ActivityKind::UpdateDocument),
            "add_tree" => Some(ActivityKind::AddTree),
            "remove_tree" => Some(ActivityKind::RemoveTree),
            "rebuild" => Some(ActivityKind::Rebuild),
            _ => None,
        }
    }
}

/// Activity as appended by the committer; the backend assigns the id
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub kind: ActivityKind,
    pub node_id: NodeId,
    pub version_id: VersionId,
    pub path: String,
    /// Opaque consumer payload, typically JSON
    pub payload: String,
}

/// Stored activity as returned by claims
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRecord {
    pub id: ActivityId,
    pub kind: ActivityKind,
    pub node_id: NodeId,
    pub version_id: VersionId,
    pub path: String,
    pub payload: String,
    pub state: RunningState,
    /// Lease stamp of the last claim; None until first claimed
    pub lock_time: Option<DateTime<Utc>>,
    /// Not persisted; stamped at claim time when the claim runs in
    /// system-start recovery mode
    pub unprocessed: bool,
}

impl ActivityRecord {
    /// Stored form of a fresh append
    pub fn from_new(id: ActivityId, activity: NewActivity) -> Self {
        Self {
            id,
            kind: activity.kind,
            node_id: activity.node_id,
            version_id: activity.version_id,
            path: activity.path,
            payload: activity.payload,
            state: RunningState::Waiting,
            lock_time: None,
            unprocessed: false,
        }
    }
}

/// Rebuilds consumer-side activity values from stored records
///
/// A factory may decline a record (unknown kind, stale payload shape);
/// declined records are skipped by claims, never an error.
pub trait ActivityFactory {
    type Output;

    fn from_record(&self, record: ActivityRecord) -> Option<Self::Output>;
}

/// Identity factory handing back the raw stored records
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordFactory;

impl ActivityFactory for RecordFactory {
    type Output = ActivityRecord;

    fn from_record(&self, record: ActivityRecord) -> Option<ActivityRecord> {
        Some(record)
    }
}
