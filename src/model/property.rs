//! Dynamic property values and binary slots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ids::NodeId;

/// Value of one named dynamic property slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum PropertyValue {
    String(String),
    Int(i64),
    Decimal(f64),
    DateTime(DateTime<Utc>),
    /// Ids of referenced nodes
    Reference(Vec<NodeId>),
    /// Long text, loadable lazily through the partial text loader
    Text(String),
}

impl PropertyValue {
    /// True for the long-text slot type
    pub fn is_text(&self) -> bool {
        matches!(self, PropertyValue::Text(_))
    }
}

/// Binary slot descriptor plus its bytes
///
/// `id` is 0 for slots the backend has not stored yet; `checksum` is the
/// hex-encoded SHA-256 of `data`, stamped by the backend on write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryValue {
    pub id: u32,
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
    pub checksum: String,
    pub data: Vec<u8>,
}

impl BinaryValue {
    /// Descriptor for fresh, not-yet-stored bytes
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            id: 0,
            file_name: file_name.into(),
            content_type: content_type.into(),
            size: data.len() as u64,
            checksum: String::new(),
            data,
        }
    }
}

/// Named dynamic properties plus binary slots of one version, as sent to the
/// backend on commit
///
/// Depending on the save strategy this carries either only the changed slots
/// (in-place update, create) or the full set (copy strategies).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicData {
    pub properties: BTreeMap<String, PropertyValue>,
    pub binaries: BTreeMap<String, BinaryValue>,
}

impl DynamicData {
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.binaries.is_empty()
    }
}
