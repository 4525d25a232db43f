//! Orchestration surface of the layer
//!
//! [`DataStore`] fronts the injected backend and cache; its operations are
//! split per concern: commits and structural changes in `save`, the read
//! surface in `load`, advisory subtree locks in `tree_lock`, the indexing
//! log in `activity`. Passthroughs with no orchestration of their own
//! (audit, schema, statistics) live here.

mod activity;
mod load;
mod save;
mod tree_lock;

use std::sync::Arc;

use crate::cache::VersionCache;
use crate::config::DataStoreConfig;
use crate::error::{DataStoreError, Result};
use crate::model::audit::AuditEvent;
use crate::model::ids::{NodeId, VersionId};
use crate::model::schema::SchemaData;
use crate::traits::backend::StorageBackend;
use crate::traits::cache::SnapshotCache;

/// Persistence orchestrator for a hierarchical, multi-version content store
///
/// Holds no in-process locks and performs no significant CPU work; every
/// operation is an I/O-bound call into the backend, safe to invoke
/// concurrently from many logical sessions. Durability, transactions and
/// ordering are the collaborators' contracts, not this type's.
pub struct DataStore {
    backend: Arc<dyn StorageBackend>,
    cache: Arc<dyn SnapshotCache>,
    config: DataStoreConfig,
}

impl DataStore {
    /// Bind a backend and cache for the life of the store
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        cache: Arc<dyn SnapshotCache>,
        config: DataStoreConfig,
    ) -> Self {
        Self {
            backend,
            cache,
            config,
        }
    }

    /// Store with the default configuration and an in-process version cache
    pub fn with_defaults(backend: Arc<dyn StorageBackend>) -> Self {
        Self::new(
            backend,
            Arc::new(VersionCache::new()),
            DataStoreConfig::default(),
        )
    }

    pub fn config(&self) -> &DataStoreConfig {
        &self.config
    }

    pub(crate) fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    pub(crate) fn cache(&self) -> &Arc<dyn SnapshotCache> {
        &self.cache
    }

    /// Gate every operation on the construction-time enable flag
    pub(crate) fn ensure_enabled(&self) -> Result<()> {
        if self.config.enabled {
            Ok(())
        } else {
            Err(DataStoreError::Disabled)
        }
    }

    // ========== Audit ==========

    /// Write one audit event through to the backend
    pub async fn write_audit_event(&self, event: AuditEvent) -> Result<()> {
        self.ensure_enabled()?;
        tracing::debug!(
            category = %event.category,
            node_id = %event.node_id,
            path = %event.path,
            "writing audit event"
        );
        self.backend.write_audit_event(event).await?;
        Ok(())
    }

    // ========== Schema ==========

    /// Load the schema blob and its change token
    pub async fn load_schema(&self) -> Result<SchemaData> {
        self.ensure_enabled()?;
        Ok(self.backend.load_schema().await?)
    }

    /// Take the exclusive schema update lock
    ///
    /// The presented timestamp must match the stored schema's; the returned
    /// token is required by [`finish_schema_update`](Self::finish_schema_update).
    pub async fn start_schema_update(&self, schema_timestamp: u64) -> Result<String> {
        self.ensure_enabled()?;
        Ok(self.backend.start_schema_update(schema_timestamp).await?)
    }

    /// Release the update lock; returns the bumped schema token
    pub async fn finish_schema_update(&self, lock_token: &str) -> Result<u64> {
        self.ensure_enabled()?;
        Ok(self.backend.finish_schema_update(lock_token).await?)
    }

    // ========== Statistics ==========

    /// Count of nodes, under `path` when given
    pub async fn node_count(&self, path: Option<&str>) -> Result<u64> {
        self.ensure_enabled()?;
        Ok(self.backend.node_count(path).await?)
    }

    /// Count of versions, under `path` when given
    pub async fn version_count(&self, path: Option<&str>) -> Result<u64> {
        self.ensure_enabled()?;
        Ok(self.backend.version_count(path).await?)
    }

    /// Total binary bytes under a path
    pub async fn tree_size(&self, path: &str, include_children: bool) -> Result<u64> {
        self.ensure_enabled()?;
        Ok(self.backend.tree_size(path, include_children).await?)
    }

    /// Head timestamp token, zero for an unknown node
    pub async fn node_timestamp(&self, node_id: NodeId) -> Result<u64> {
        self.ensure_enabled()?;
        Ok(self.backend.node_timestamp(node_id).await?)
    }

    /// Version timestamp token, zero for an unknown version
    pub async fn version_timestamp(&self, version_id: VersionId) -> Result<u64> {
        self.ensure_enabled()?;
        Ok(self.backend.version_timestamp(version_id).await?)
    }
}
