//! Reservation detail screen.
//!
//! ```text
//! Idle ──load──▶ Loading ──▶ Success ──▶ Enriching ──▶ Enriched
//!                   │
//!                   └──▶ Error ──retry──▶ Loading
//!                          └──navigate_back──▶ Closed
//! ```
//!
//! Partial and fallback requests skip `Loading` and render straight away.

use std::sync::Arc;

use thiserror::Error;
use vetbook_api::{AccessToken, ApiError, ClinicBackend, ErrorKind, RawRecord};

use crate::models::{OverrideMap, ReservationRecord};
use crate::normalizer::Normalizer;
use crate::overrides::{OverrideError, OverrideStore};
use crate::session::Session;

use super::{Lifetime, Outcome};

/// What the host has when it opens the detail screen.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailRequest {
    /// Only an appointment id; fetch everything.
    ById(String),
    /// A record from the list; show it, then fetch the complete appointment.
    Partial(ReservationRecord),
    /// A record to show as-is, without an appointment fetch.
    Fallback(ReservationRecord),
}

/// Why a detail load failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum DetailFailure {
    AuthRequired,
    NotFound,
    Network,
}

impl From<ErrorKind> for DetailFailure {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Auth => DetailFailure::AuthRequired,
            ErrorKind::NotFound => DetailFailure::NotFound,
            ErrorKind::Network => DetailFailure::Network,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Idle,
    Loading,
    Success(ReservationRecord),
    Enriching(ReservationRecord),
    Enriched(ReservationRecord),
    Error {
        failure: DetailFailure,
        message: String,
    },
    Closed,
}

impl DetailState {
    pub fn name(&self) -> &'static str {
        match self {
            DetailState::Idle => "idle",
            DetailState::Loading => "loading",
            DetailState::Success(_) => "success",
            DetailState::Enriching(_) => "enriching",
            DetailState::Enriched(_) => "enriched",
            DetailState::Error { .. } => "error",
            DetailState::Closed => "closed",
        }
    }

    /// The record on screen, if any.
    pub fn record(&self) -> Option<&ReservationRecord> {
        match self {
            DetailState::Success(record)
            | DetailState::Enriching(record)
            | DetailState::Enriched(record) => Some(record),
            _ => None,
        }
    }
}

/// Detail controller errors.
#[derive(Error, Debug)]
pub enum DetailError {
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },

    #[error("Override store error: {0}")]
    Overrides(#[from] OverrideError),
}

pub type DetailResult<T> = Result<T, DetailError>;

/// Drives one detail screen.
pub struct ReservationDetailController {
    backend: Arc<dyn ClinicBackend>,
    overrides: OverrideStore,
    normalizer: Normalizer,
    lifetime: Lifetime,
    state: DetailState,
    request: Option<DetailRequest>,
    appointment: Option<RawRecord>,
}

impl ReservationDetailController {
    pub fn new(
        backend: Arc<dyn ClinicBackend>,
        overrides: OverrideStore,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            backend,
            overrides,
            normalizer,
            lifetime: Lifetime::new(),
            state: DetailState::Idle,
            request: None,
            appointment: None,
        }
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime.clone()
    }

    pub async fn load(
        &mut self,
        session: &Session,
        request: DetailRequest,
    ) -> DetailResult<Outcome<()>> {
        self.ensure_not(&[DetailState::Closed], "load")?;
        self.request = Some(request.clone());
        self.appointment = None;
        self.run(session, request).await
    }

    /// Repeat the last request after a failure.
    pub async fn retry(&mut self, session: &Session) -> DetailResult<Outcome<()>> {
        let request = match (&self.state, &self.request) {
            (DetailState::Error { .. }, Some(request)) => request.clone(),
            _ => return Err(self.invalid("retry")),
        };
        self.run(session, request).await
    }

    /// Leave a failed screen. Terminal.
    pub fn navigate_back(&mut self) -> DetailResult<()> {
        if !matches!(self.state, DetailState::Error { .. }) {
            return Err(self.invalid("navigate back"));
        }
        self.lifetime.cancel();
        self.state = DetailState::Closed;
        Ok(())
    }

    async fn run(&mut self, session: &Session, request: DetailRequest) -> DetailResult<Outcome<()>> {
        let overrides = self.overrides.get_all()?;

        match request {
            DetailRequest::ById(id) => {
                self.state = DetailState::Loading;
                let fetched = self.backend.appointment_details(&session.token, &id).await;
                if self.lifetime.is_cancelled() {
                    return Ok(Outcome::Discarded);
                }
                match fetched {
                    Ok(appointment) => {
                        let record = self.normalize(&appointment, &overrides, None);
                        self.appointment = Some(appointment);
                        self.state = DetailState::Success(record);
                    }
                    Err(err) => {
                        tracing::warn!(appointment_id = %id, error = %err, "detail fetch failed");
                        self.state = DetailState::Error {
                            failure: err.kind().into(),
                            message: err.to_string(),
                        };
                        return Ok(Outcome::Applied(()));
                    }
                }
            }
            DetailRequest::Partial(record) => {
                let stable = record.id.is_stable();
                self.state = DetailState::Success(record.clone());
                if stable {
                    let fetched = self
                        .backend
                        .appointment_details(&session.token, record.id.as_str())
                        .await;
                    if self.lifetime.is_cancelled() {
                        return Ok(Outcome::Discarded);
                    }
                    match fetched {
                        Ok(appointment) => {
                            let full = self.normalize(&appointment, &overrides, Some(&record));
                            self.appointment = Some(appointment);
                            self.state = DetailState::Success(full);
                        }
                        Err(err) => {
                            tracing::warn!(
                                appointment_id = %record.id,
                                error = %err,
                                "complete record unavailable, showing partial"
                            );
                        }
                    }
                }
            }
            DetailRequest::Fallback(record) => {
                self.state = DetailState::Success(record);
            }
        }

        self.enrich(&session.token, &overrides).await
    }

    /// Fetch pet and doctor detail for placeholder fields.
    async fn enrich(&mut self, token: &AccessToken, overrides: &OverrideMap) -> DetailResult<Outcome<()>> {
        let record = match &self.state {
            DetailState::Success(record) => record.clone(),
            _ => return Ok(Outcome::Applied(())),
        };
        if !record.needs_enrichment(self.normalizer.placeholder())
            || (record.pet_id.is_none() && record.doctor_id.is_none())
        {
            return Ok(Outcome::Applied(()));
        }

        self.state = DetailState::Enriching(record.clone());

        let backend = Arc::clone(&self.backend);
        let pet_id = record.pet_id.as_deref();
        let doctor_id = record.doctor_id.as_deref();
        let (pet, doctor) = tokio::join!(
            async {
                match pet_id {
                    Some(id) => best_effort("pet", id, backend.pet_detail(token, id).await),
                    None => None,
                }
            },
            async {
                match doctor_id {
                    Some(id) => best_effort("doctor", id, backend.doctor_detail(token, id).await),
                    None => None,
                }
            },
        );
        if self.lifetime.is_cancelled() {
            return Ok(Outcome::Discarded);
        }

        let mut enriched = match &self.appointment {
            Some(appointment) => {
                let mut fresh = self.normalizer.normalize_appointment(
                    appointment,
                    pet.as_ref(),
                    doctor.as_ref(),
                    overrides,
                );
                fresh.keep_shown(&record, self.normalizer.placeholder());
                fresh
            }
            None => record,
        };
        self.normalizer
            .apply_enrichment(&mut enriched, pet.as_ref(), doctor.as_ref());

        self.state = DetailState::Enriched(enriched);
        Ok(Outcome::Applied(()))
    }

    /// Normalize a fetched appointment on top of whatever is already shown.
    fn normalize(
        &self,
        appointment: &RawRecord,
        overrides: &OverrideMap,
        shown: Option<&ReservationRecord>,
    ) -> ReservationRecord {
        let mut record = self
            .normalizer
            .normalize_appointment(appointment, None, None, overrides);
        if let Some(shown) = shown {
            record.keep_shown(shown, self.normalizer.placeholder());
        }
        record
    }

    fn ensure_not(&self, states: &[DetailState], action: &'static str) -> DetailResult<()> {
        if states.contains(&self.state) {
            return Err(self.invalid(action));
        }
        Ok(())
    }

    fn invalid(&self, action: &'static str) -> DetailError {
        DetailError::InvalidTransition {
            state: self.state.name(),
            action,
        }
    }
}

fn best_effort(what: &'static str, id: &str, result: Result<RawRecord, ApiError>) -> Option<RawRecord> {
    match result {
        Ok(record) => Some(record),
        Err(err) => {
            tracing::warn!(kind = what, id, error = %err, "enrichment lookup failed");
            None
        }
    }
}
