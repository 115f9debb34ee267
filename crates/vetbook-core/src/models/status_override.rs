//! Device-local status override.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A status change applied on this device and not (yet) confirmed by the
/// backend. Persisted as `{"status": ..., "timestamp": ..., "synced": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalStatusOverride {
    /// Backend vocabulary, exactly as chosen.
    pub status: String,
    /// RFC 3339 time of the change.
    pub timestamp: String,
    /// Whether the backend has acknowledged the change.
    #[serde(default)]
    pub synced: bool,
}

impl LocalStatusOverride {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            synced: false,
        }
    }
}

/// All overrides keyed by appointment id.
pub type OverrideMap = BTreeMap<String, LocalStatusOverride>;
