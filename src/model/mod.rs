//! Data model of the persistence-orchestration layer

pub mod activity;
pub mod audit;
pub mod ids;
pub mod node;
pub mod path;
pub mod property;
pub mod save;
pub mod schema;
pub mod snapshot;
pub mod version;

// Re-export all types
#[allow(unused_imports)]
pub use activity::{
    ActivityFactory, ActivityKind, ActivityRecord, NewActivity, RecordFactory, RunningState,
};

#[allow(unused_imports)]
pub use audit::AuditEvent;

#[allow(unused_imports)]
pub use ids::{ActivityId, NodeId, TreeLockId, VersionId};

#[allow(unused_imports)]
pub use node::{CommitResult, NodeHead, NodeHeadData};

#[allow(unused_imports)]
pub use property::{BinaryValue, DynamicData, PropertyValue};

#[allow(unused_imports)]
pub use save::{SaveSettings, SaveStrategy};

#[allow(unused_imports)]
pub use schema::SchemaData;

#[allow(unused_imports)]
pub use snapshot::{NodeSnapshot, NodeToken};

#[allow(unused_imports)]
pub use version::{NodeVersionInfo, VersionData, VersionNumber};
