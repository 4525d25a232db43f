//! Save settings and the persistence-strategy decision
//!
//! Every commit carries a [`SaveSettings`] describing which version the edit
//! targets; [`SaveStrategy::select`] turns snapshot identity plus settings
//! into exactly one of four strategies, once, before any I/O.

use super::ids::VersionId;
use super::snapshot::NodeSnapshot;

/// Per-commit settings handed to `save_node`
///
/// `expected_version_id` selects the strategy for already-persisted nodes:
/// equal to `current_version_id` means edit in place, unassigned means derive
/// a fresh version, any other assigned id means restore into that version.
/// The `*_after` slots are outputs, filled from the backend's commit result.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveSettings {
    /// Version the edit started from
    pub current_version_id: VersionId,

    /// Version the edit should land in (see type-level docs)
    pub expected_version_id: VersionId,

    /// False for a head-only touch: no version row is persisted, only head
    /// fields and the prune list
    pub needs_version_data: bool,

    /// Versions the commit prunes atomically with the write
    pub deletable_version_ids: Vec<VersionId>,

    /// Output: head's last-major version id after the commit
    pub last_major_version_id_after: VersionId,

    /// Output: head's last-minor version id after the commit
    pub last_minor_version_id_after: VersionId,
}

impl SaveSettings {
    /// Edit the current version in place
    pub fn update_in_place(current_version_id: VersionId) -> Self {
        Self {
            current_version_id,
            expected_version_id: current_version_id,
            needs_version_data: true,
            deletable_version_ids: Vec::new(),
            last_major_version_id_after: VersionId::UNASSIGNED,
            last_minor_version_id_after: VersionId::UNASSIGNED,
        }
    }

    /// Derive a new version from the current one
    pub fn new_version(current_version_id: VersionId) -> Self {
        Self {
            current_version_id,
            expected_version_id: VersionId::UNASSIGNED,
            needs_version_data: true,
            deletable_version_ids: Vec::new(),
            last_major_version_id_after: VersionId::UNASSIGNED,
            last_minor_version_id_after: VersionId::UNASSIGNED,
        }
    }

    /// Restore the current content into an explicit existing version
    pub fn restore_version(current_version_id: VersionId, target: VersionId) -> Self {
        Self {
            current_version_id,
            expected_version_id: target,
            needs_version_data: true,
            deletable_version_ids: Vec::new(),
            last_major_version_id_after: VersionId::UNASSIGNED,
            last_minor_version_id_after: VersionId::UNASSIGNED,
        }
    }

    /// Head-only touch: update head fields and prune, skip version data
    pub fn head_only(current_version_id: VersionId) -> Self {
        Self {
            current_version_id,
            expected_version_id: current_version_id,
            needs_version_data: false,
            deletable_version_ids: Vec::new(),
            last_major_version_id_after: VersionId::UNASSIGNED,
            last_minor_version_id_after: VersionId::UNASSIGNED,
        }
    }
}

/// Persistence strategy of one commit
///
/// Produced once by [`SaveStrategy::select`] and dispatched on; the enum is
/// exhaustive, so an unknown strategy cannot reach the dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStrategy {
    /// Node has never been persisted; insert head, version and dynamic data
    CreateNew,

    /// Edit the current version in place
    UpdateInPlace { renamed: bool },

    /// Derive a fresh version from the current one
    CopyToNewVersion { renamed: bool },

    /// Copy the current content into an explicit target version
    CopyToVersion { target: VersionId, renamed: bool },
}

impl SaveStrategy {
    /// Pure decision function over snapshot identity and settings
    ///
    /// `renamed` is true only for already-persisted nodes whose path moved
    /// away from its last committed value.
    pub fn select(snapshot: &NodeSnapshot, settings: &SaveSettings) -> Self {
        if !snapshot.id.is_assigned() {
            return SaveStrategy::CreateNew;
        }
        let renamed = snapshot.path_changed();
        if !settings.expected_version_id.is_assigned() {
            return SaveStrategy::CopyToNewVersion { renamed };
        }
        if settings.expected_version_id == settings.current_version_id {
            return SaveStrategy::UpdateInPlace { renamed };
        }
        SaveStrategy::CopyToVersion {
            target: settings.expected_version_id,
            renamed,
        }
    }
}
