//! Audit event passthrough payload

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ids::{NodeId, VersionId};

/// One audit-log entry, written through to the backend unmodified
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: Uuid,
    pub category: String,
    pub node_id: NodeId,
    pub version_id: VersionId,
    pub path: String,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Event stamped with a fresh id and the current time
    pub fn new(
        category: impl Into<String>,
        node_id: NodeId,
        version_id: VersionId,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            category: category.into(),
            node_id,
            version_id,
            path: path.into(),
            message: message.into(),
            occurred_at: Utc::now(),
        }
    }
}
