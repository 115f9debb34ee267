//! Reservation list for customers and doctors.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use vetbook_api::{ApiError, ClinicBackend, ErrorKind, RawRecord};

use crate::models::{fingerprint, sort_newest_first, OverrideMap, ReservationRecord};
use crate::normalizer::{NormalizeInput, Normalizer};
use crate::overrides::{OverrideError, OverrideStore};
use crate::session::Session;

use super::{Lifetime, Outcome};

/// Whose reservations the list shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, uniffi::Enum)]
pub enum ListAudience {
    /// Appointments the signed-in customer booked.
    Customer,
    /// Appointments assigned to the signed-in doctor.
    Doctor,
}

/// List errors.
#[derive(Error, Debug)]
pub enum ListError {
    /// The token was rejected; the host should return to sign-in.
    #[error("Authentication required: {0}")]
    AuthRequired(ApiError),

    /// Anything else. The previous list stays in place.
    #[error("Could not load reservations: {0}")]
    Retryable(ApiError),

    #[error("Override store error: {0}")]
    Overrides(#[from] OverrideError),

    #[error("Fingerprint error: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

impl From<ApiError> for ListError {
    fn from(err: ApiError) -> Self {
        match err.kind() {
            ErrorKind::Auth => ListError::AuthRequired(err),
            ErrorKind::NotFound | ErrorKind::Network => ListError::Retryable(err),
        }
    }
}

pub type ListResult<T> = Result<T, ListError>;

/// Result of a completed refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOutcome {
    /// Whether the visible list differs from the previous one.
    pub changed: bool,
}

/// One successfully loaded list, already sorted and partitioned.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationList {
    /// Everything not completed, newest first.
    pub active: Vec<ReservationRecord>,
    /// Completed reservations, newest first.
    pub completed: Vec<ReservationRecord>,
    /// SHA-256 over the sorted records.
    pub fingerprint: String,
    pub fetched_at: DateTime<Utc>,
}

impl ReservationList {
    /// Sort and partition normalized records.
    pub fn build(mut records: Vec<ReservationRecord>) -> Result<Self, serde_json::Error> {
        sort_newest_first(&mut records);
        let fingerprint = fingerprint(&records)?;
        let (completed, active) = records
            .into_iter()
            .partition(|record| record.status.is_completed());
        Ok(Self {
            active,
            completed,
            fingerprint,
            fetched_at: Utc::now(),
        })
    }

    pub fn len(&self) -> usize {
        self.active.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Loads and holds the reservation list for one audience.
pub struct ReservationListController {
    audience: ListAudience,
    backend: Arc<dyn ClinicBackend>,
    overrides: OverrideStore,
    normalizer: Normalizer,
    lifetime: Lifetime,
    should_refresh: AtomicBool,
    current: Option<ReservationList>,
}

impl ReservationListController {
    pub fn new(
        audience: ListAudience,
        backend: Arc<dyn ClinicBackend>,
        overrides: OverrideStore,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            audience,
            backend,
            overrides,
            normalizer,
            lifetime: Lifetime::new(),
            should_refresh: AtomicBool::new(false),
            current: None,
        }
    }

    pub fn audience(&self) -> ListAudience {
        self.audience
    }

    /// Handle for cancelling in-flight refreshes from another thread.
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime.clone()
    }

    /// Replace a cancelled lifetime so a reopened screen can refresh again.
    /// The loaded list is kept.
    pub fn reopen(&mut self) -> Lifetime {
        if self.lifetime.is_cancelled() {
            self.lifetime = Lifetime::new();
        }
        self.lifetime.clone()
    }

    /// Last successfully loaded list.
    pub fn current(&self) -> Option<&ReservationList> {
        self.current.as_ref()
    }

    /// Ask for a refresh the next time the screen gains focus.
    pub fn request_refresh(&self) {
        self.should_refresh.store(true, Ordering::SeqCst);
    }

    /// Refresh once if a refresh was requested; `None` when there was
    /// nothing to do.
    pub async fn on_focus(&mut self, session: &Session) -> ListResult<Option<Outcome<ListOutcome>>> {
        if !self.should_refresh.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        self.refresh(session).await.map(Some)
    }

    /// Fetch, normalize and replace the list.
    ///
    /// On error the previous list is kept.
    pub async fn refresh(&mut self, session: &Session) -> ListResult<Outcome<ListOutcome>> {
        let fetched = match self.audience {
            ListAudience::Customer => {
                self.backend
                    .user_appointments(&session.token, &session.user_id)
                    .await
            }
            ListAudience::Doctor => {
                self.backend
                    .doctor_appointments(&session.token, &session.user_id)
                    .await
            }
        };
        if self.lifetime.is_cancelled() {
            return Ok(Outcome::Discarded);
        }

        let raw = fetched.map_err(|err| {
            tracing::warn!(audience = ?self.audience, error = %err, "reservation fetch failed");
            ListError::from(err)
        })?;

        let overrides = self.overrides.get_all()?;
        let mut records = self.normalize_all(&raw, &overrides);

        if self.audience == ListAudience::Doctor {
            self.fill_doctor_name(session, &mut records).await;
            if self.lifetime.is_cancelled() {
                return Ok(Outcome::Discarded);
            }
        }

        let list = ReservationList::build(records)?;
        let changed = self
            .current
            .as_ref()
            .map_or(true, |previous| previous.fingerprint != list.fingerprint);

        tracing::info!(
            audience = ?self.audience,
            active = list.active.len(),
            completed = list.completed.len(),
            changed,
            "reservations refreshed"
        );
        self.current = Some(list);
        Ok(Outcome::Applied(ListOutcome { changed }))
    }

    fn normalize_all(&self, raw: &[RawRecord], overrides: &OverrideMap) -> Vec<ReservationRecord> {
        raw.iter()
            .filter_map(|appointment| {
                match self
                    .normalizer
                    .normalize(NormalizeInput::appointment(appointment), overrides)
                {
                    Ok(record) => Some(record),
                    Err(err) => {
                        tracing::warn!(error = %err, "skipping reservation");
                        None
                    }
                }
            })
            .collect()
    }

    /// One doctor lookup per refresh, only when some item lacks a name.
    async fn fill_doctor_name(&self, session: &Session, records: &mut [ReservationRecord]) {
        let placeholder = self.normalizer.placeholder();
        if !records.iter().any(|r| r.doctor_name == placeholder) {
            return;
        }

        match self
            .backend
            .doctor_detail(&session.token, &session.user_id)
            .await
        {
            Ok(doctor) => {
                for record in records.iter_mut() {
                    self.normalizer.apply_enrichment(record, None, Some(&doctor));
                }
            }
            Err(err) => {
                tracing::warn!(doctor_id = %session.user_id, error = %err, "doctor lookup failed");
            }
        }
    }
}
