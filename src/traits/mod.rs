//! Trait definitions for the injected backend and cache

pub mod backend;
pub mod cache;

// Re-export all types
#[allow(unused_imports)]
pub use backend::{ExecutableActivities, StorageBackend};

#[allow(unused_imports)]
pub use cache::SnapshotCache;
