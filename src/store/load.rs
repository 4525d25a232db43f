//! Read surface: bulk version loads and head queries
//!
//! The bulk loader probes the cache per version id and coalesces all misses
//! into one batched backend call. A version absent from the batch result is
//! a "lost version" - the token stays unattached and the caller decides what
//! that means.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{DataStoreError, Result};
use crate::model::ids::{NodeId, VersionId};
use crate::model::node::NodeHead;
use crate::model::property::BinaryValue;
use crate::model::snapshot::NodeToken;
use crate::model::version::{NodeVersionInfo, VersionNumber};

use super::DataStore;

impl DataStore {
    /// Bulk load: one token per (head, version id) pair, order preserved
    ///
    /// Cache hits attach immediately; the distinct missing version ids go to
    /// the backend in a single batch. Every loaded snapshot is cached before
    /// it is attached. Tokens whose version the batch did not return stay
    /// unattached.
    pub async fn load_nodes(
        &self,
        heads: &[NodeHead],
        version_ids: &[VersionId],
    ) -> Result<Vec<NodeToken>> {
        self.ensure_enabled()?;
        if heads.len() != version_ids.len() {
            return Err(DataStoreError::InvalidArgument(format!(
                "{} heads paired with {} version ids",
                heads.len(),
                version_ids.len()
            )));
        }

        let mut tokens = Vec::with_capacity(heads.len());
        let mut missing = BTreeSet::new();
        for (head, version_id) in heads.iter().zip(version_ids) {
            let mut token = NodeToken::pending(head.clone(), *version_id);
            match self.cache().get(*version_id) {
                Some(snapshot) => token.snapshot = Some(snapshot),
                None => {
                    missing.insert(*version_id);
                }
            }
            tokens.push(token);
        }

        if missing.is_empty() {
            return Ok(tokens);
        }
        tracing::debug!(
            requested = tokens.len(),
            misses = missing.len(),
            "batch loading versions"
        );

        let loaded = self
            .backend()
            .load_versions(missing.into_iter().collect())
            .await?;
        for snapshot in loaded {
            let snapshot = Arc::new(snapshot);
            self.cache().insert(snapshot.clone());
            for token in tokens
                .iter_mut()
                .filter(|t| t.version_id == snapshot.version_id)
            {
                token.snapshot = Some(snapshot.clone());
            }
        }
        Ok(tokens)
    }

    // ========== Head Queries ==========

    /// Head by its current path (case-insensitive)
    pub async fn load_node_head_by_path(&self, path: &str) -> Result<Option<NodeHead>> {
        self.ensure_enabled()?;
        Ok(self.backend().load_node_head_by_path(path).await?)
    }

    /// Head by node id
    pub async fn load_node_head(&self, node_id: NodeId) -> Result<Option<NodeHead>> {
        self.ensure_enabled()?;
        Ok(self.backend().load_node_head(node_id).await?)
    }

    /// Head owning a version
    pub async fn load_node_head_by_version(
        &self,
        version_id: VersionId,
    ) -> Result<Option<NodeHead>> {
        self.ensure_enabled()?;
        Ok(self.backend().load_node_head_by_version(version_id).await?)
    }

    /// Batched head load; missing ids are absent from the result
    pub async fn load_node_heads(&self, node_ids: Vec<NodeId>) -> Result<Vec<NodeHead>> {
        self.ensure_enabled()?;
        Ok(self.backend().load_node_heads(node_ids).await?)
    }

    /// True when a node exists at the path
    pub async fn node_exists(&self, path: &str) -> Result<bool> {
        self.ensure_enabled()?;
        Ok(self.backend().node_exists(path).await?)
    }

    // ========== Version Queries ==========

    /// All versions of a node, ordered by version number
    pub async fn node_versions(&self, node_id: NodeId) -> Result<Vec<NodeVersionInfo>> {
        self.ensure_enabled()?;
        Ok(self.backend().node_versions(node_id).await?)
    }

    /// Version numbers of a node, ordered
    pub async fn version_numbers(&self, node_id: NodeId) -> Result<Vec<VersionNumber>> {
        self.ensure_enabled()?;
        Ok(self.backend().version_numbers(node_id).await?)
    }

    // ========== Partial Loaders ==========

    /// Load named long-text slots without pulling the full snapshot
    pub async fn load_text_properties(
        &self,
        version_id: VersionId,
        names: Vec<String>,
    ) -> Result<std::collections::BTreeMap<String, String>> {
        self.ensure_enabled()?;
        Ok(self
            .backend()
            .load_text_properties(version_id, names)
            .await?)
    }

    /// Load one binary slot of a version
    pub async fn load_binary_property(
        &self,
        version_id: VersionId,
        name: &str,
    ) -> Result<Option<BinaryValue>> {
        self.ensure_enabled()?;
        Ok(self.backend().load_binary_property(version_id, name).await?)
    }
}

#[cfg(all(test, feature = "memory"))]
mod tests {
    use super::*;
    use crate::backend::memory::InMemoryBackend;
    use crate::cancel::CancelToken;
    use crate::model::property::PropertyValue;
    use crate::model::save::SaveSettings;
    use crate::model::snapshot::NodeSnapshot;

    fn store() -> DataStore {
        DataStore::with_defaults(Arc::new(InMemoryBackend::new()))
    }

    async fn saved(store: &DataStore, item_path: &str) -> NodeSnapshot {
        let mut snapshot = NodeSnapshot::new_item(NodeId(1), item_path, 1);
        snapshot.set_property("DisplayName", PropertyValue::String("x".into()));
        let mut settings = SaveSettings::new_version(VersionId::UNASSIGNED);
        store
            .save_node(&mut snapshot, &mut settings, &CancelToken::new())
            .await
            .unwrap();
        snapshot
    }

    // ========== Bulk Load ==========

    #[tokio::test]
    async fn test_load_nodes_order_preserved() {
        let store = store();
        let a = saved(&store, "/Root/A").await;
        let b = saved(&store, "/Root/B").await;

        let head_a = store.load_node_head(a.id).await.unwrap().unwrap();
        let head_b = store.load_node_head(b.id).await.unwrap().unwrap();

        let tokens = store
            .load_nodes(
                &[head_b.clone(), head_a.clone()],
                &[b.version_id, a.version_id],
            )
            .await
            .unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].version_id, b.version_id);
        assert_eq!(tokens[1].version_id, a.version_id);
        assert!(tokens.iter().all(NodeToken::is_loaded));
    }

    #[tokio::test]
    async fn test_lost_version_leaves_token_unattached() {
        let store = store();
        let a = saved(&store, "/Root/A").await;
        let head = store.load_node_head(a.id).await.unwrap().unwrap();

        let tokens = store
            .load_nodes(&[head.clone(), head], &[a.version_id, VersionId(999)])
            .await
            .unwrap();
        assert!(tokens[0].is_loaded());
        assert!(!tokens[1].is_loaded());
    }

    #[tokio::test]
    async fn test_duplicate_version_ids_both_attach() {
        let store = store();
        let a = saved(&store, "/Root/A").await;
        let head = store.load_node_head(a.id).await.unwrap().unwrap();

        let tokens = store
            .load_nodes(&[head.clone(), head], &[a.version_id, a.version_id])
            .await
            .unwrap();
        assert!(tokens[0].is_loaded());
        assert!(tokens[1].is_loaded());
    }

    #[tokio::test]
    async fn test_mismatched_lengths_rejected() {
        let store = store();
        let err = store.load_nodes(&[], &[VersionId(1)]).await.unwrap_err();
        assert!(matches!(err, DataStoreError::InvalidArgument(_)));
    }

    // ========== Head Queries ==========

    #[tokio::test]
    async fn test_head_queries_agree() {
        let store = store();
        let a = saved(&store, "/Root/A").await;

        let by_id = store.load_node_head(a.id).await.unwrap().unwrap();
        let by_path = store
            .load_node_head_by_path("/root/a")
            .await
            .unwrap()
            .unwrap();
        let by_version = store
            .load_node_head_by_version(a.version_id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(by_id, by_path);
        assert_eq!(by_id, by_version);
        assert!(store.node_exists("/Root/A").await.unwrap());
        assert!(!store.node_exists("/Root/Missing").await.unwrap());
    }
}
