//! Node commit and load operations of the in-memory backend

use std::collections::BTreeMap;

use crate::error::BackendError;
use crate::model::ids::{NodeId, VersionId};
use crate::model::node::{CommitResult, NodeHead, NodeHeadData};
use crate::model::path;
use crate::model::property::{BinaryValue, DynamicData};
use crate::model::snapshot::NodeSnapshot;
use crate::model::version::{NodeVersionInfo, VersionData, VersionNumber};

use super::store::{Dataset, InMemoryBackend, VersionRow};

impl InMemoryBackend {
    pub(super) fn insert_node_impl(
        &self,
        head: NodeHeadData,
        version: VersionData,
        mut dynamic: DynamicData,
    ) -> Result<CommitResult, BackendError> {
        let mut data = self.dataset()?;
        if data
            .nodes
            .values()
            .any(|n| n.path.eq_ignore_ascii_case(&head.path))
        {
            return Err(BackendError::Constraint(format!(
                "node already exists at {}",
                head.path
            )));
        }

        let node_id = data.take_node_id();
        let version_id = data.take_version_id();
        data.seal_binaries(&mut dynamic.binaries);
        let node_timestamp = data.next_timestamp();
        let version_timestamp = data.next_timestamp();

        data.versions.insert(
            version_id,
            VersionRow {
                node_id,
                number: version.number,
                created_at: version.created_at,
                modified_at: version.modified_at,
                timestamp: version_timestamp,
                properties: dynamic.properties,
                binaries: dynamic.binaries,
            },
        );
        let (last_major, last_minor) = data.last_versions_of(node_id);
        data.nodes.insert(
            node_id,
            NodeHead {
                id: node_id,
                parent_id: head.parent_id,
                path: head.path,
                name: head.name,
                node_type_id: head.node_type_id,
                created_at: head.created_at,
                modified_at: head.modified_at,
                last_major_version_id: last_major,
                last_minor_version_id: last_minor,
                timestamp: node_timestamp,
            },
        );

        Ok(CommitResult {
            node_id,
            version_id,
            node_timestamp,
            version_timestamp,
            last_major_version_id: last_major,
            last_minor_version_id: last_minor,
        })
    }

    pub(super) fn update_node_impl(
        &self,
        head: NodeHeadData,
        version: VersionData,
        mut dynamic: DynamicData,
        delete_versions: Vec<VersionId>,
        old_path: Option<String>,
    ) -> Result<CommitResult, BackendError> {
        let mut data = self.dataset()?;
        check_head_token(&data, &head)?;

        if !data
            .versions
            .get(&version.version_id)
            .is_some_and(|row| row.node_id == head.node_id)
        {
            return Err(BackendError::NotFound(format!(
                "version {} of node {}",
                version.version_id, head.node_id
            )));
        }

        data.seal_binaries(&mut dynamic.binaries);
        let version_timestamp = data.next_timestamp();
        let row = data
            .versions
            .get_mut(&version.version_id)
            .expect("checked above");
        row.number = version.number;
        row.modified_at = version.modified_at;
        row.timestamp = version_timestamp;
        row.properties.extend(dynamic.properties);
        row.binaries.extend(dynamic.binaries);

        prune_versions(&mut data, head.node_id, &delete_versions);
        if let Some(old) = old_path {
            migrate_subtree(&mut data, &old, &head.path);
        }
        let node_timestamp = apply_head(&mut data, &head);

        let (last_major, last_minor) = data.last_versions_of(head.node_id);
        finish_head(&mut data, head.node_id, last_major, last_minor);
        Ok(CommitResult {
            node_id: head.node_id,
            version_id: version.version_id,
            node_timestamp,
            version_timestamp,
            last_major_version_id: last_major,
            last_minor_version_id: last_minor,
        })
    }

    pub(super) fn copy_and_update_node_impl(
        &self,
        head: NodeHeadData,
        version: VersionData,
        mut dynamic: DynamicData,
        delete_versions: Vec<VersionId>,
        source_version: VersionId,
        target_version: Option<VersionId>,
        old_path: Option<String>,
    ) -> Result<CommitResult, BackendError> {
        let mut data = self.dataset()?;
        check_head_token(&data, &head)?;

        let source = data
            .versions
            .get(&source_version)
            .filter(|row| row.node_id == head.node_id)
            .cloned()
            .ok_or_else(|| {
                BackendError::NotFound(format!(
                    "source version {} of node {}",
                    source_version, head.node_id
                ))
            })?;

        let version_id = match target_version {
            Some(target) => {
                if !data
                    .versions
                    .get(&target)
                    .is_some_and(|row| row.node_id == head.node_id)
                {
                    return Err(BackendError::NotFound(format!(
                        "target version {} of node {}",
                        target, head.node_id
                    )));
                }
                target
            }
            None => data.take_version_id(),
        };

        // Copy the source, then overlay the (full) dynamic set
        data.seal_binaries(&mut dynamic.binaries);
        let version_timestamp = data.next_timestamp();
        let mut properties = source.properties;
        properties.extend(dynamic.properties);
        let mut binaries = source.binaries;
        binaries.extend(dynamic.binaries);
        data.versions.insert(
            version_id,
            VersionRow {
                node_id: head.node_id,
                number: version.number,
                created_at: version.created_at,
                modified_at: version.modified_at,
                timestamp: version_timestamp,
                properties,
                binaries,
            },
        );

        prune_versions(&mut data, head.node_id, &delete_versions);
        if let Some(old) = old_path {
            migrate_subtree(&mut data, &old, &head.path);
        }
        let node_timestamp = apply_head(&mut data, &head);

        let (last_major, last_minor) = data.last_versions_of(head.node_id);
        finish_head(&mut data, head.node_id, last_major, last_minor);
        Ok(CommitResult {
            node_id: head.node_id,
            version_id,
            node_timestamp,
            version_timestamp,
            last_major_version_id: last_major,
            last_minor_version_id: last_minor,
        })
    }

    pub(super) fn update_node_head_impl(
        &self,
        head: NodeHeadData,
        delete_versions: Vec<VersionId>,
    ) -> Result<CommitResult, BackendError> {
        let mut data = self.dataset()?;
        check_head_token(&data, &head)?;

        prune_versions(&mut data, head.node_id, &delete_versions);
        let node_timestamp = apply_head(&mut data, &head);

        let (last_major, last_minor) = data.last_versions_of(head.node_id);
        finish_head(&mut data, head.node_id, last_major, last_minor);
        Ok(CommitResult {
            node_id: head.node_id,
            version_id: VersionId::UNASSIGNED,
            node_timestamp,
            version_timestamp: 0,
            last_major_version_id: last_major,
            last_minor_version_id: last_minor,
        })
    }

    pub(super) fn delete_node_impl(&self, head: NodeHeadData) -> Result<(), BackendError> {
        let mut data = self.dataset()?;
        check_head_token(&data, &head)?;
        let root_path = data.nodes[&head.node_id].path.clone();

        let doomed: Vec<NodeId> = data
            .nodes
            .values()
            .filter(|n| path::is_ancestor_or_self(&root_path, &n.path))
            .map(|n| n.id)
            .collect();
        for node_id in &doomed {
            data.nodes.remove(node_id);
        }
        data.versions.retain(|_, row| !doomed.contains(&row.node_id));
        Ok(())
    }

    pub(super) fn move_node_impl(
        &self,
        source: NodeHeadData,
        target_node_id: NodeId,
        target_timestamp: u64,
    ) -> Result<u64, BackendError> {
        let mut data = self.dataset()?;
        check_head_token(&data, &source)?;
        let target = data
            .nodes
            .get(&target_node_id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("node {target_node_id}")))?;
        if target_timestamp != 0 && target.timestamp != target_timestamp {
            return Err(BackendError::OutOfDate(format!("node {target_node_id}")));
        }

        let old_path = data.nodes[&source.node_id].path.clone();
        let new_path = format!("{}/{}", target.path, source.name);
        if path::is_ancestor_or_self(&old_path, &target.path) {
            return Err(BackendError::Constraint(
                "cannot move a node under its own subtree".into(),
            ));
        }
        if data
            .nodes
            .values()
            .any(|n| n.path.eq_ignore_ascii_case(&new_path))
        {
            return Err(BackendError::Constraint(format!(
                "node already exists at {new_path}"
            )));
        }

        migrate_subtree(&mut data, &old_path, &new_path);
        let source_timestamp = data.next_timestamp();
        let target_timestamp = data.next_timestamp();
        {
            let node = data.nodes.get_mut(&source.node_id).expect("checked above");
            node.parent_id = target_node_id;
            node.timestamp = source_timestamp;
        }
        if let Some(node) = data.nodes.get_mut(&target_node_id) {
            node.timestamp = target_timestamp;
        }
        Ok(source_timestamp)
    }

    // ========== Loads ==========

    pub(super) fn load_versions_impl(
        &self,
        version_ids: Vec<VersionId>,
    ) -> Result<Vec<NodeSnapshot>, BackendError> {
        let data = self.dataset()?;
        let mut snapshots = Vec::new();
        for version_id in version_ids {
            let Some(row) = data.versions.get(&version_id) else {
                continue; // lost version
            };
            let Some(head) = data.nodes.get(&row.node_id) else {
                continue;
            };
            snapshots.push(NodeSnapshot::loaded(
                head,
                version_id,
                row.number,
                row.timestamp,
                row.properties.clone(),
                row.binaries.clone(),
            ));
        }
        Ok(snapshots)
    }

    pub(super) fn load_node_head_by_path_impl(
        &self,
        node_path: &str,
    ) -> Result<Option<NodeHead>, BackendError> {
        let data = self.dataset()?;
        Ok(data
            .nodes
            .values()
            .find(|n| n.path.eq_ignore_ascii_case(node_path))
            .cloned())
    }

    pub(super) fn load_node_head_impl(
        &self,
        node_id: NodeId,
    ) -> Result<Option<NodeHead>, BackendError> {
        let data = self.dataset()?;
        Ok(data.nodes.get(&node_id).cloned())
    }

    pub(super) fn load_node_head_by_version_impl(
        &self,
        version_id: VersionId,
    ) -> Result<Option<NodeHead>, BackendError> {
        let data = self.dataset()?;
        Ok(data
            .versions
            .get(&version_id)
            .and_then(|row| data.nodes.get(&row.node_id))
            .cloned())
    }

    pub(super) fn load_node_heads_impl(
        &self,
        node_ids: Vec<NodeId>,
    ) -> Result<Vec<NodeHead>, BackendError> {
        let data = self.dataset()?;
        Ok(node_ids
            .into_iter()
            .filter_map(|id| data.nodes.get(&id).cloned())
            .collect())
    }

    pub(super) fn node_versions_impl(
        &self,
        node_id: NodeId,
    ) -> Result<Vec<NodeVersionInfo>, BackendError> {
        let data = self.dataset()?;
        let mut versions: Vec<NodeVersionInfo> = data
            .versions
            .iter()
            .filter(|(_, row)| row.node_id == node_id)
            .map(|(version_id, row)| NodeVersionInfo {
                version_id: *version_id,
                number: row.number,
            })
            .collect();
        versions.sort_by_key(|info| info.number);
        Ok(versions)
    }

    pub(super) fn version_numbers_impl(
        &self,
        node_id: NodeId,
    ) -> Result<Vec<VersionNumber>, BackendError> {
        Ok(self
            .node_versions_impl(node_id)?
            .into_iter()
            .map(|info| info.number)
            .collect())
    }

    pub(super) fn node_exists_impl(&self, node_path: &str) -> Result<bool, BackendError> {
        let data = self.dataset()?;
        Ok(data
            .nodes
            .values()
            .any(|n| n.path.eq_ignore_ascii_case(node_path)))
    }

    pub(super) fn load_text_properties_impl(
        &self,
        version_id: VersionId,
        names: Vec<String>,
    ) -> Result<BTreeMap<String, String>, BackendError> {
        let data = self.dataset()?;
        let Some(row) = data.versions.get(&version_id) else {
            return Ok(BTreeMap::new());
        };
        Ok(names
            .into_iter()
            .filter_map(|name| {
                let value = row.properties.get(&name)?;
                match value {
                    crate::model::property::PropertyValue::Text(text) => {
                        Some((name, text.clone()))
                    }
                    _ => None,
                }
            })
            .collect())
    }

    pub(super) fn load_binary_property_impl(
        &self,
        version_id: VersionId,
        name: &str,
    ) -> Result<Option<BinaryValue>, BackendError> {
        let data = self.dataset()?;
        Ok(data
            .versions
            .get(&version_id)
            .and_then(|row| row.binaries.get(name))
            .cloned())
    }

    // ========== Statistics ==========

    pub(super) fn node_count_impl(&self, under: Option<&str>) -> Result<u64, BackendError> {
        let data = self.dataset()?;
        Ok(data
            .nodes
            .values()
            .filter(|n| under.is_none_or(|p| path::is_ancestor_or_self(p, &n.path)))
            .count() as u64)
    }

    pub(super) fn version_count_impl(&self, under: Option<&str>) -> Result<u64, BackendError> {
        let data = self.dataset()?;
        Ok(data
            .versions
            .values()
            .filter(|row| {
                under.is_none_or(|p| {
                    data.nodes
                        .get(&row.node_id)
                        .is_some_and(|n| path::is_ancestor_or_self(p, &n.path))
                })
            })
            .count() as u64)
    }

    pub(super) fn tree_size_impl(
        &self,
        node_path: &str,
        include_children: bool,
    ) -> Result<u64, BackendError> {
        let data = self.dataset()?;
        let in_scope = |candidate: &str| {
            if include_children {
                path::is_ancestor_or_self(node_path, candidate)
            } else {
                candidate.eq_ignore_ascii_case(node_path)
            }
        };
        Ok(data
            .versions
            .values()
            .filter(|row| {
                data.nodes
                    .get(&row.node_id)
                    .is_some_and(|n| in_scope(&n.path))
            })
            .flat_map(|row| row.binaries.values())
            .map(|binary| binary.size)
            .sum())
    }

    pub(super) fn node_timestamp_impl(&self, node_id: NodeId) -> Result<u64, BackendError> {
        let data = self.dataset()?;
        Ok(data.nodes.get(&node_id).map_or(0, |n| n.timestamp))
    }

    pub(super) fn version_timestamp_impl(
        &self,
        version_id: VersionId,
    ) -> Result<u64, BackendError> {
        let data = self.dataset()?;
        Ok(data.versions.get(&version_id).map_or(0, |row| row.timestamp))
    }
}

/// Reject a commit whose head token is stale
fn check_head_token(data: &Dataset, head: &NodeHeadData) -> Result<(), BackendError> {
    let stored = data
        .nodes
        .get(&head.node_id)
        .ok_or_else(|| BackendError::NotFound(format!("node {}", head.node_id)))?;
    if stored.timestamp != head.timestamp {
        return Err(BackendError::OutOfDate(format!("node {}", head.node_id)));
    }
    Ok(())
}

/// Drop pruned versions; only versions of the committing node qualify
fn prune_versions(data: &mut Dataset, node_id: NodeId, delete_versions: &[VersionId]) {
    for version_id in delete_versions {
        if data
            .versions
            .get(version_id)
            .is_some_and(|row| row.node_id == node_id)
        {
            data.versions.remove(version_id);
        }
    }
}

/// Rewrite every path inside `old_root` into `new_root` (rename, move)
fn migrate_subtree(data: &mut Dataset, old_root: &str, new_root: &str) {
    for node in data.nodes.values_mut() {
        if let Some(rerooted) = path::reroot(&node.path, old_root, new_root) {
            node.path = rerooted;
            node.name = path::name(&node.path).to_string();
        }
    }
}

/// Apply incoming head fields and stamp a fresh timestamp token
fn apply_head(data: &mut Dataset, head: &NodeHeadData) -> u64 {
    let timestamp = data.next_timestamp();
    let node = data
        .nodes
        .get_mut(&head.node_id)
        .expect("token check passed");
    node.parent_id = head.parent_id;
    node.path = head.path.clone();
    node.name = head.name.clone();
    node.node_type_id = head.node_type_id;
    node.modified_at = head.modified_at;
    node.timestamp = timestamp;
    timestamp
}

/// Write recomputed last-version pointers back into the head
fn finish_head(
    data: &mut Dataset,
    node_id: NodeId,
    last_major: VersionId,
    last_minor: VersionId,
) {
    if let Some(node) = data.nodes.get_mut(&node_id) {
        node.last_major_version_id = last_major;
        node.last_minor_version_id = last_minor;
    }
}
