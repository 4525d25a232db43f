//! Data store configuration

use std::time::Duration;

/// Configuration for a [`DataStore`](crate::DataStore)
///
/// Threaded through construction; there is no process-wide state.
#[derive(Debug, Clone)]
pub struct DataStoreConfig {
    /// When false, every operation fails with
    /// [`DataStoreError::Disabled`](crate::DataStoreError::Disabled) before
    /// any I/O is dispatched.
    pub enabled: bool,

    /// Maximum accepted node path length, in bytes
    pub path_max_length: usize,

    /// Lease window granted to claimed indexing activities. An activity left
    /// Running past this window is reclaimable by any worker.
    pub activity_lease: Duration,
}

impl Default for DataStoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path_max_length: 450,
            activity_lease: Duration::from_secs(60),
        }
    }
}

impl DataStoreConfig {
    /// Load from environment variables
    ///
    /// Reads `NODESTORE_ENABLED`, `NODESTORE_PATH_MAX_LENGTH` and
    /// `NODESTORE_ACTIVITY_LEASE_SECS`; unset or unparsable values fall back
    /// to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let enabled = std::env::var("NODESTORE_ENABLED")
            .ok()
            .map(|s| s == "true" || s == "1")
            .unwrap_or(defaults.enabled);

        let path_max_length = std::env::var("NODESTORE_PATH_MAX_LENGTH")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.path_max_length);

        let activity_lease = std::env::var("NODESTORE_ACTIVITY_LEASE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.activity_lease);

        Self {
            enabled,
            path_max_length,
            activity_lease,
        }
    }
}
