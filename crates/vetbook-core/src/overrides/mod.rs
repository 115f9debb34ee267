//! Device-local status overrides.
//!
//! A doctor can change an appointment's status on the device before the
//! backend knows about it. The change is stored here, keyed by appointment
//! id, and wins over the backend status until it is synced.

mod sync;

pub use sync::*;

use thiserror::Error;
use vetbook_api::ApiError;

use crate::db::{self, DbError, SharedDatabase, KEY_STATUS_OVERRIDES};
use crate::models::{BackendStatus, LocalStatusOverride, OverrideMap, ReservationId};

/// Override store errors.
#[derive(Error, Debug)]
pub enum OverrideError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Identifier {0} was generated locally and cannot carry an override")]
    UnstableIdentifier(String),

    #[error("Backend error: {0}")]
    Api(#[from] ApiError),
}

pub type OverrideResult<T> = Result<T, OverrideError>;

/// Read/write access to the persisted override map.
#[derive(Clone)]
pub struct OverrideStore {
    db: SharedDatabase,
}

impl OverrideStore {
    pub fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    /// Record a status change for an appointment, replacing any earlier one.
    pub fn set_override(
        &self,
        id: &ReservationId,
        status: BackendStatus,
    ) -> OverrideResult<LocalStatusOverride> {
        if !id.is_stable() {
            return Err(OverrideError::UnstableIdentifier(id.to_string()));
        }

        let entry = LocalStatusOverride::new(status.as_str());
        let stored = entry.clone();
        let key = id.as_str().to_string();

        let mut conn = db::lock(&self.db)?;
        conn.update_value(KEY_STATUS_OVERRIDES, move |current| {
            let mut map = parse_map(current.as_deref());
            map.insert(key, stored);
            Ok(Some(serde_json::to_string(&map)?))
        })?;

        tracing::info!(appointment_id = %id, status = %status, "status override recorded");
        Ok(entry)
    }

    /// The full override map; empty when nothing is stored or the stored
    /// value is unreadable.
    pub fn get_all(&self) -> OverrideResult<OverrideMap> {
        let conn = db::lock(&self.db)?;
        let raw = conn.get_value(KEY_STATUS_OVERRIDES)?;
        Ok(parse_map(raw.as_deref()))
    }

    pub fn get(&self, id: &str) -> OverrideResult<Option<LocalStatusOverride>> {
        Ok(self.get_all()?.remove(id))
    }

    /// Overrides the backend has not acknowledged yet.
    pub fn pending(&self) -> OverrideResult<OverrideMap> {
        let mut map = self.get_all()?;
        map.retain(|_, entry| !entry.synced);
        Ok(map)
    }

    /// Drop overrides the backend has accepted.
    ///
    /// Each id is paired with the timestamp that was pushed. An entry that
    /// changed again since then stays in place.
    pub fn mark_synced(&self, acknowledged: &[(String, String)]) -> OverrideResult<usize> {
        if acknowledged.is_empty() {
            return Ok(0);
        }

        let mut removed = 0;
        let mut conn = db::lock(&self.db)?;
        conn.update_value(KEY_STATUS_OVERRIDES, |current| {
            let Some(current) = current else {
                return Ok(None);
            };
            let mut map = parse_map(Some(&current));
            for (id, timestamp) in acknowledged {
                if map.get(id).is_some_and(|entry| &entry.timestamp == timestamp) {
                    map.remove(id);
                    removed += 1;
                }
            }
            if map.is_empty() {
                Ok(None)
            } else {
                Ok(Some(serde_json::to_string(&map)?))
            }
        })?;

        Ok(removed)
    }

    /// Remove every override. Returns whether anything was stored.
    pub fn clear_all(&self) -> OverrideResult<bool> {
        let conn = db::lock(&self.db)?;
        Ok(conn.delete_value(KEY_STATUS_OVERRIDES)?)
    }
}

fn parse_map(raw: Option<&str>) -> OverrideMap {
    let Some(raw) = raw else {
        return OverrideMap::new();
    };
    match serde_json::from_str(raw) {
        Ok(map) => map,
        Err(err) => {
            tracing::warn!(error = %err, "stored status overrides are unreadable, ignoring them");
            OverrideMap::new()
        }
    }
}
