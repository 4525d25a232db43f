//! Identifier newtypes
//!
//! Node, version and tree-lock ids use 0 as the "not yet assigned" sentinel;
//! the backend assigns real ids at first insert. Activity ids grow
//! monotonically for the life of the log.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a node head record
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NodeId(pub u32);

/// Identity of a version record, unique and immutable once assigned
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct VersionId(pub u32);

/// Identity of an advisory tree lock
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TreeLockId(pub u32);

/// Position of an activity in the indexing log; assigned monotonically by
/// the backend on append
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ActivityId(pub u64);

macro_rules! unassigned_sentinel {
    ($name:ident) => {
        impl $name {
            /// The "not yet persisted" sentinel
            pub const UNASSIGNED: Self = Self(0);

            /// True once the backend has assigned a real id
            pub fn is_assigned(&self) -> bool {
                self.0 != 0
            }
        }
    };
}

unassigned_sentinel!(NodeId);
unassigned_sentinel!(VersionId);
unassigned_sentinel!(TreeLockId);

impl ActivityId {
    /// Id below the first activity of any log
    pub const ZERO: Self = Self(0);

    /// The id directly after this one
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TreeLockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
