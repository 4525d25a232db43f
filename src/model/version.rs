//! Version numbers and the version write model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{NodeId, VersionId};

/// Two-part version number
///
/// A version is *major* iff its minor part is zero (`V2.0` is major,
/// `V2.1` is a minor draft on top of it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VersionNumber {
    pub major: u16,
    pub minor: u16,
}

impl VersionNumber {
    pub fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// First version of a fresh node
    pub fn first() -> Self {
        Self::new(1, 0)
    }

    /// True for public versions (`minor == 0`)
    pub fn is_major(&self) -> bool {
        self.minor == 0
    }

    /// The next major version (`V2.3` → `V3.0`)
    pub fn next_major(&self) -> Self {
        Self::new(self.major + 1, 0)
    }

    /// The next minor version (`V2.3` → `V2.4`)
    pub fn next_minor(&self) -> Self {
        Self::new(self.major, self.minor + 1)
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}.{}", self.major, self.minor)
    }
}

/// Write model of one version row, passed to the backend on commit
///
/// `version_id` is 0 for versions the backend has not assigned yet; the
/// assigned id comes back in the commit result and is written into the
/// snapshot by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionData {
    pub version_id: VersionId,
    pub node_id: NodeId,
    pub number: VersionNumber,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    /// Optimistic-concurrency token of the version row (expected-before)
    pub timestamp: u64,
}

/// One entry of a node's version list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeVersionInfo {
    pub version_id: VersionId,
    pub number: VersionNumber,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_major_minor() {
        assert!(VersionNumber::new(1, 0).is_major());
        assert!(VersionNumber::new(3, 0).is_major());
        assert!(!VersionNumber::new(1, 1).is_major());
    }

    #[test]
    fn test_first() {
        let v = VersionNumber::first();
        assert_eq!(v, VersionNumber::new(1, 0));
        assert!(v.is_major());
    }

    #[test]
    fn test_next_major_resets_minor() {
        assert_eq!(VersionNumber::new(2, 3).next_major(), VersionNumber::new(3, 0));
    }

    #[test]
    fn test_next_minor() {
        assert_eq!(VersionNumber::new(2, 3).next_minor(), VersionNumber::new(2, 4));
        assert_eq!(VersionNumber::new(1, 0).next_minor(), VersionNumber::new(1, 1));
    }

    #[test]
    fn test_ordering() {
        assert!(VersionNumber::new(1, 9) < VersionNumber::new(2, 0));
        assert!(VersionNumber::new(2, 0) < VersionNumber::new(2, 1));
    }

    #[test]
    fn test_display() {
        assert_eq!(VersionNumber::new(1, 0).to_string(), "V1.0");
        assert_eq!(VersionNumber::new(12, 34).to_string(), "V12.34");
    }
}
