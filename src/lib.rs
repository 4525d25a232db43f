//! nodestore - persistence orchestration for a hierarchical, multi-version
//! content store
//!
//! This crate decides how a change to a content item becomes backend storage
//! operations, serializes structural operations on overlapping subtrees
//! through advisory tree locks, maintains the durable, strictly ordered
//! indexing activity log that keeps a full-text index in sync with committed
//! content, and fronts hot version reads with a dependency-invalidated
//! snapshot cache.
//!
//! The durable storage engine, the indexing engine, permission enforcement
//! and the schema system are external collaborators reached through the
//! [`StorageBackend`] and [`SnapshotCache`] traits, bound once at
//! composition time. The crate owns no wire protocol and no on-disk format.
//!
//! ```no_run
//! use nodestore::{CancelToken, DataStore, InMemoryBackend, NodeSnapshot, SaveSettings};
//! use nodestore::model::{NodeId, PropertyValue, VersionId};
//! use std::sync::Arc;
//!
//! # async fn demo() -> nodestore::Result<()> {
//! let store = DataStore::with_defaults(Arc::new(InMemoryBackend::new()));
//!
//! let mut snapshot = NodeSnapshot::new_item(NodeId(1), "/Root/Docs/Readme", 1);
//! snapshot.set_property("DisplayName", PropertyValue::String("Readme".into()));
//! let mut settings = SaveSettings::new_version(VersionId::UNASSIGNED);
//! store.save_node(&mut snapshot, &mut settings, &CancelToken::new()).await?;
//! assert!(snapshot.id.is_assigned());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod cancel;
pub mod config;
pub mod error;
pub mod model;
pub mod store;
pub mod traits;
pub mod watermark;

#[cfg(feature = "memory")]
pub mod backend;

// Re-exports
pub use cache::{NullSnapshotCache, VersionCache};
pub use cancel::CancelToken;
pub use config::DataStoreConfig;
pub use error::{BackendError, DataStoreError, Result};
pub use model::{NodeSnapshot, NodeToken, SaveSettings, SaveStrategy};
pub use store::DataStore;
pub use traits::{SnapshotCache, StorageBackend};
pub use watermark::{ActivityStatus, ActivityWatermark};

#[cfg(feature = "memory")]
pub use backend::InMemoryBackend;
