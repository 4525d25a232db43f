//! Schema blob and its change token
//!
//! The content type/schema system is an external collaborator; this layer
//! only moves the opaque blob and guards concurrent updates through the
//! experimental update lock.

use serde::{Deserialize, Serialize};

/// Opaque schema definition plus its change token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaData {
    /// Schema body, owned by the external schema system
    pub blob: serde_json::Value,

    /// Monotonic token bumped by every finished schema update; callers
    /// present it when starting an update and are rejected when stale
    pub timestamp: u64,
}

impl SchemaData {
    /// Empty schema of a fresh store
    pub fn empty() -> Self {
        Self {
            blob: serde_json::Value::Null,
            timestamp: 0,
        }
    }
}
