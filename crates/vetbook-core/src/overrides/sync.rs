//! Push pending overrides to the backend.
//!
//! Protocol, per pending entry:
//! 1. `PUT /appointment/update/update/{id}` with `{"status": ...}`
//! 2. On success, drop the entry (the backend status is authoritative again)
//! 3. On failure, keep it pending and report it
//!
//! An auth failure stops the run: every later request would fail the same way.

use vetbook_api::{ClinicBackend, ErrorKind};

use crate::session::Session;

use super::{OverrideResult, OverrideStore};

/// What a sync run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    /// Appointment ids the backend accepted.
    pub pushed: Vec<String>,
    /// Appointment ids that stay pending, with the failure message.
    pub failed: Vec<(String, String)>,
    /// The run was skipped because sync is disabled.
    pub skipped: bool,
}

/// Sync driver for the override store.
pub struct OverrideSync<'a> {
    store: &'a OverrideStore,
    backend: &'a dyn ClinicBackend,
    enabled: bool,
}

impl<'a> OverrideSync<'a> {
    pub fn new(store: &'a OverrideStore, backend: &'a dyn ClinicBackend, enabled: bool) -> Self {
        Self {
            store,
            backend,
            enabled,
        }
    }

    pub async fn sync_pending(&self, session: &Session) -> OverrideResult<SyncReport> {
        if !self.enabled {
            tracing::debug!("status sync disabled, skipping");
            return Ok(SyncReport {
                skipped: true,
                ..SyncReport::default()
            });
        }

        let pending = self.store.pending()?;
        let mut report = SyncReport::default();
        let mut acknowledged = Vec::new();

        for (id, entry) in pending {
            match self
                .backend
                .update_appointment_status(&session.token, &id, &entry.status)
                .await
            {
                Ok(()) => {
                    acknowledged.push((id.clone(), entry.timestamp));
                    report.pushed.push(id);
                }
                Err(err) if err.kind() == ErrorKind::Auth => {
                    // Keep what already went through.
                    self.store.mark_synced(&acknowledged)?;
                    return Err(err.into());
                }
                Err(err) => {
                    tracing::warn!(appointment_id = %id, error = %err, "status sync failed");
                    report.failed.push((id, err.to_string()));
                }
            }
        }

        self.store.mark_synced(&acknowledged)?;
        tracing::info!(
            pushed = report.pushed.len(),
            failed = report.failed.len(),
            "status sync finished"
        );
        Ok(report)
    }
}
