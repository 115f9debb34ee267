//! Vetbook Core Library
//!
//! Local-first reservation data layer for the veterinary clinic app.
//!
//! # Architecture
//!
//! ```text
//!   Clinic REST API (vetbook-api)
//!          │  raw appointment / pet / doctor records
//!          ▼
//!     Normalizer ◀──── OverrideStore (local status changes, SQLite)
//!          │  ReservationRecord
//!          ▼
//!   ┌──────┴─────────────────────┐
//!   │                            │
//! ReservationListController   ReservationDetailController
//!   (customer / doctor)         (load, enrich, retry)
//!          │                            │
//!          └──────────┬─────────────────┘
//!                     ▼
//!              VetbookCore (FFI)
//! ```
//!
//! # Core Principle
//!
//! **A status changed on this device wins until the backend confirms it.**
//! Overrides are keyed by backend appointment id only; records without one
//! never pick up local state.
//!
//! # Modules
//!
//! - [`db`]: SQLite key-value persistence
//! - [`models`]: Display model and status vocabularies
//! - [`session`]: Signed-in identity
//! - [`overrides`]: Local status overrides and their sync
//! - [`normalizer`]: Raw record → display record
//! - [`controllers`]: List and detail screen state

pub mod config;
pub mod controllers;
pub mod db;
pub mod models;
pub mod normalizer;
pub mod overrides;
pub mod session;

// Re-export commonly used types
pub use config::CoreConfig;
pub use controllers::{
    DetailFailure, DetailRequest, DetailState, Lifetime, ListAudience, Outcome,
    ReservationDetailController, ReservationList, ReservationListController,
};
pub use db::Database;
pub use models::{
    map_status, BackendStatus, DisplayLocale, DisplayStatus, IdOrigin, LocalStatusOverride,
    ReservationId, ReservationRecord,
};
pub use normalizer::Normalizer;
pub use overrides::{OverrideStore, OverrideSync, SyncReport};
pub use session::{Session, SessionStore};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing_subscriber::EnvFilter;
use vetbook_api::{AccessToken, ApiConfig, ApiError, ClinicBackend, ClinicClient, ErrorKind};

use controllers::{DetailError, ListError, ListOutcome};
use db::{DbError, SharedDatabase};
use overrides::OverrideError;
use session::SessionError;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum VetbookError {
    #[error("Authentication required: {0}")]
    AuthRequired(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ApiError> for VetbookError {
    fn from(e: ApiError) -> Self {
        match e.kind() {
            ErrorKind::Auth => VetbookError::AuthRequired(e.to_string()),
            ErrorKind::NotFound => VetbookError::NotFound(e.to_string()),
            ErrorKind::Network => VetbookError::Network(e.to_string()),
        }
    }
}

impl From<vetbook_api::ConfigError> for VetbookError {
    fn from(e: vetbook_api::ConfigError) -> Self {
        VetbookError::InvalidInput(e.to_string())
    }
}

impl From<DbError> for VetbookError {
    fn from(e: DbError) -> Self {
        VetbookError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for VetbookError {
    fn from(e: serde_json::Error) -> Self {
        VetbookError::Serialization(e.to_string())
    }
}

impl From<SessionError> for VetbookError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Database(e) => e.into(),
            SessionError::NotSignedIn | SessionError::MissingUserId => {
                VetbookError::AuthRequired(e.to_string())
            }
            SessionError::Invalid(_) => VetbookError::InvalidInput(e.to_string()),
        }
    }
}

impl From<OverrideError> for VetbookError {
    fn from(e: OverrideError) -> Self {
        match e {
            OverrideError::Database(e) => e.into(),
            OverrideError::UnstableIdentifier(_) => VetbookError::InvalidInput(e.to_string()),
            OverrideError::Api(e) => e.into(),
        }
    }
}

impl From<ListError> for VetbookError {
    fn from(e: ListError) -> Self {
        match e {
            ListError::AuthRequired(e) | ListError::Retryable(e) => e.into(),
            ListError::Overrides(e) => e.into(),
            ListError::Fingerprint(e) => e.into(),
        }
    }
}

impl From<DetailError> for VetbookError {
    fn from(e: DetailError) -> Self {
        match e {
            DetailError::InvalidTransition { .. } => VetbookError::InvalidInput(e.to_string()),
            DetailError::Overrides(e) => e.into(),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for VetbookError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        VetbookError::Internal(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Install the tracing subscriber. `RUST_LOG` overrides the default filter.
/// Safe to call more than once.
#[uniffi::export]
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vetbook_core=info,vetbook_api=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Open or create the database at the given path and connect to the API.
#[uniffi::export]
pub fn open_core(db_path: String, api_base_url: String) -> Result<Arc<VetbookCore>, VetbookError> {
    let db = Database::open(&db_path)?;
    open_with_database(db, &api_base_url)
}

/// In-memory database (for testing).
#[uniffi::export]
pub fn open_core_in_memory(api_base_url: String) -> Result<Arc<VetbookCore>, VetbookError> {
    let db = Database::open_in_memory()?;
    open_with_database(db, &api_base_url)
}

fn open_with_database(db: Database, api_base_url: &str) -> Result<Arc<VetbookCore>, VetbookError> {
    let api_config = ApiConfig::new(api_base_url)?.with_env_overrides();
    let client = ClinicClient::new(api_config)?;
    let core = VetbookCore::with_backend(db, Arc::new(client), CoreConfig::from_env())?;
    Ok(Arc::new(core))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe core for FFI.
///
/// Blocking methods run their async work on an owned runtime; call them off
/// the UI thread.
#[derive(uniffi::Object)]
pub struct VetbookCore {
    db: SharedDatabase,
    runtime: tokio::runtime::Runtime,
    config: CoreConfig,
    backend: Arc<dyn ClinicBackend>,
    sessions: SessionStore,
    overrides: OverrideStore,
    normalizer: Normalizer,
    customer_list: Mutex<ReservationListController>,
    doctor_list: Mutex<ReservationListController>,
    detail: Mutex<ReservationDetailController>,
    // Held apart from the controllers, whose locks stay taken for a whole
    // fetch.
    customer_lifetime: Mutex<Lifetime>,
    doctor_lifetime: Mutex<Lifetime>,
    detail_lifetime: Mutex<Lifetime>,
}

impl VetbookCore {
    /// Build a core around any backend.
    pub fn with_backend(
        db: Database,
        backend: Arc<dyn ClinicBackend>,
        config: CoreConfig,
    ) -> Result<Self, VetbookError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .map_err(|e| VetbookError::Internal(format!("runtime: {e}")))?;

        let db = db.into_shared();
        let overrides = OverrideStore::new(db.clone());
        let normalizer = Normalizer::new(&config);
        let detail = ReservationDetailController::new(
            backend.clone(),
            overrides.clone(),
            normalizer.clone(),
        );
        let [customer_list, doctor_list] = [ListAudience::Customer, ListAudience::Doctor]
            .map(|audience| {
                ReservationListController::new(
                    audience,
                    backend.clone(),
                    overrides.clone(),
                    normalizer.clone(),
                )
            });

        Ok(Self {
            sessions: SessionStore::new(db.clone()),
            customer_lifetime: Mutex::new(customer_list.lifetime()),
            doctor_lifetime: Mutex::new(doctor_list.lifetime()),
            detail_lifetime: Mutex::new(detail.lifetime()),
            customer_list: Mutex::new(customer_list),
            doctor_list: Mutex::new(doctor_list),
            detail: Mutex::new(detail),
            db,
            runtime,
            config,
            backend,
            overrides,
            normalizer,
        })
    }

    fn list(&self, audience: ListAudience) -> &Mutex<ReservationListController> {
        match audience {
            ListAudience::Customer => &self.customer_list,
            ListAudience::Doctor => &self.doctor_list,
        }
    }

    fn list_lifetime(&self, audience: ListAudience) -> &Mutex<Lifetime> {
        match audience {
            ListAudience::Customer => &self.customer_lifetime,
            ListAudience::Doctor => &self.doctor_lifetime,
        }
    }

    /// Give a closed list a fresh lifetime and publish it for `close_list`.
    fn reopen_list(
        &self,
        audience: ListAudience,
        list: &mut ReservationListController,
    ) -> Result<(), VetbookError> {
        *self.list_lifetime(audience).lock()? = list.reopen();
        Ok(())
    }

    fn list_snapshot(
        &self,
        controller: &ReservationListController,
        changed: bool,
    ) -> Option<FfiReservationList> {
        controller
            .current()
            .map(|list| FfiReservationList::from_list(list, changed, self.config.locale))
    }

    fn new_list(&self, audience: ListAudience) -> ReservationListController {
        ReservationListController::new(
            audience,
            self.backend.clone(),
            self.overrides.clone(),
            self.normalizer.clone(),
        )
    }

    fn new_detail(&self) -> ReservationDetailController {
        ReservationDetailController::new(
            self.backend.clone(),
            self.overrides.clone(),
            self.normalizer.clone(),
        )
    }

    fn detail_snapshot(&self, detail: &ReservationDetailController) -> FfiDetailState {
        FfiDetailState::from_state(detail.state(), self.config.locale)
    }
}

#[uniffi::export]
impl VetbookCore {
    // =========================================================================
    // Session Operations
    // =========================================================================

    /// Store credentials after sign-in. The user id is taken from
    /// `user_id` when given, else from the user object's id fields.
    pub fn sign_in(
        &self,
        token: String,
        user_json: Option<String>,
        user_id: Option<String>,
    ) -> Result<(), VetbookError> {
        let token = AccessToken::new(token);
        let user = user_json
            .map(|raw| serde_json::from_str::<serde_json::Value>(&raw))
            .transpose()?;

        let session = match (user_id, user) {
            (Some(id), user) => {
                let session = Session::new(token, id);
                match user {
                    Some(user) => session.with_user(user),
                    None => session,
                }
            }
            (None, Some(user)) => Session::from_user(token, user)?,
            (None, None) => {
                return Err(VetbookError::InvalidInput(
                    "either user_id or user_json is required".into(),
                ))
            }
        };

        self.sessions.save(&session)?;
        Ok(())
    }

    /// Forget the session and everything loaded with it.
    pub fn sign_out(&self) -> Result<(), VetbookError> {
        for audience in [ListAudience::Customer, ListAudience::Doctor] {
            self.list_lifetime(audience).lock()?.cancel();
        }
        self.detail_lifetime.lock()?.cancel();
        self.sessions.clear()?;

        for audience in [ListAudience::Customer, ListAudience::Doctor] {
            let mut list = self.list(audience).lock()?;
            *list = self.new_list(audience);
            *self.list_lifetime(audience).lock()? = list.lifetime();
        }
        let mut detail = self.detail.lock()?;
        *detail = self.new_detail();
        *self.detail_lifetime.lock()? = detail.lifetime();
        tracing::info!("signed out");
        Ok(())
    }

    pub fn is_signed_in(&self) -> Result<bool, VetbookError> {
        Ok(self.sessions.load()?.is_some())
    }

    // =========================================================================
    // List Operations
    // =========================================================================

    /// Fetch the list now (initial load and pull-to-refresh).
    pub fn refresh_reservations(
        &self,
        audience: ListAudience,
    ) -> Result<Option<FfiReservationList>, VetbookError> {
        let session = self.sessions.require()?;
        let mut list = self.list(audience).lock()?;
        self.reopen_list(audience, &mut list)?;
        let outcome = self.runtime.block_on(list.refresh(&session))?;
        Ok(outcome
            .applied()
            .and_then(|ListOutcome { changed }| self.list_snapshot(&list, changed)))
    }

    /// Mark the list stale; the next `on_focus` refreshes it.
    pub fn request_refresh(&self, audience: ListAudience) -> Result<(), VetbookError> {
        self.list(audience).lock()?.request_refresh();
        Ok(())
    }

    /// Refresh if one was requested. `None` when nothing was refreshed.
    pub fn on_focus(
        &self,
        audience: ListAudience,
    ) -> Result<Option<FfiReservationList>, VetbookError> {
        let session = self.sessions.require()?;
        let mut list = self.list(audience).lock()?;
        self.reopen_list(audience, &mut list)?;
        let outcome = self.runtime.block_on(list.on_focus(&session))?;
        Ok(outcome
            .and_then(Outcome::applied)
            .and_then(|ListOutcome { changed }| self.list_snapshot(&list, changed)))
    }

    /// Leave a list screen. An in-flight refresh is discarded; the next
    /// refresh starts a new lifetime.
    pub fn close_list(&self, audience: ListAudience) -> Result<(), VetbookError> {
        self.list_lifetime(audience).lock()?.cancel();
        Ok(())
    }

    /// Last loaded list without fetching.
    pub fn cached_reservations(
        &self,
        audience: ListAudience,
    ) -> Result<Option<FfiReservationList>, VetbookError> {
        let list = self.list(audience).lock()?;
        Ok(self.list_snapshot(&list, false))
    }

    // =========================================================================
    // Detail Operations
    // =========================================================================

    /// Open the detail screen. Cancels whatever the previous one was doing.
    pub fn open_detail(&self, request: FfiDetailRequest) -> Result<FfiDetailState, VetbookError> {
        let session = self.sessions.require()?;
        self.detail_lifetime.lock()?.cancel();

        let mut detail = self.detail.lock()?;
        *detail = self.new_detail();
        *self.detail_lifetime.lock()? = detail.lifetime();

        self.runtime.block_on(detail.load(&session, request.into()))?;
        Ok(self.detail_snapshot(&detail))
    }

    pub fn retry_detail(&self) -> Result<FfiDetailState, VetbookError> {
        let session = self.sessions.require()?;
        let mut detail = self.detail.lock()?;
        self.runtime.block_on(detail.retry(&session))?;
        Ok(self.detail_snapshot(&detail))
    }

    pub fn detail_state(&self) -> Result<FfiDetailState, VetbookError> {
        let detail = self.detail.lock()?;
        Ok(self.detail_snapshot(&detail))
    }

    /// Leave the detail screen. In-flight work is discarded.
    pub fn close_detail(&self) -> Result<(), VetbookError> {
        self.detail_lifetime.lock()?.cancel();
        if let Ok(mut detail) = self.detail.try_lock() {
            if matches!(detail.state(), DetailState::Error { .. }) {
                detail.navigate_back()?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Status Override Operations
    // =========================================================================

    /// Record a status change made on this device.
    pub fn set_status(
        &self,
        reservation: FfiReservation,
        status: BackendStatus,
    ) -> Result<FfiStatusOverride, VetbookError> {
        let id = ReservationId {
            value: reservation.id.clone(),
            origin: reservation.id_origin,
        };
        let entry = self.overrides.set_override(&id, status)?;
        for audience in [ListAudience::Customer, ListAudience::Doctor] {
            self.list(audience).lock()?.request_refresh();
        }
        Ok(FfiStatusOverride::new(reservation.id, entry))
    }

    pub fn pending_status_overrides(&self) -> Result<Vec<FfiStatusOverride>, VetbookError> {
        Ok(self
            .overrides
            .pending()?
            .into_iter()
            .map(|(id, entry)| FfiStatusOverride::new(id, entry))
            .collect())
    }

    pub fn clear_status_overrides(&self) -> Result<bool, VetbookError> {
        Ok(self.overrides.clear_all()?)
    }

    /// Push pending overrides. A no-op unless `VETBOOK_STATUS_SYNC` is on.
    pub fn sync_status_overrides(&self) -> Result<FfiSyncReport, VetbookError> {
        let session = self.sessions.require()?;
        let sync = OverrideSync::new(
            &self.overrides,
            self.backend.as_ref(),
            self.config.status_sync_enabled,
        );
        let report = self.runtime.block_on(sync.sync_pending(&session))?;
        Ok(report.into())
    }

    /// Display label for a status in the configured locale.
    pub fn status_label(&self, status: DisplayStatus) -> String {
        status.label(self.config.locale).to_string()
    }

    /// Whether the database handle is still usable.
    pub fn health_check(&self) -> Result<bool, VetbookError> {
        let db = db::lock(&self.db)?;
        db.conn()
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(DbError::from)?;
        Ok(true)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe reservation.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReservation {
    pub id: String,
    pub id_origin: IdOrigin,
    pub pet_name: String,
    pub doctor_name: String,
    pub date: String,
    pub time: String,
    pub status: DisplayStatus,
    pub status_label: String,
    pub notes: String,
    pub species: String,
    pub breed: String,
    pub age: String,
    pub phone: String,
    pub last_visit: Option<String>,
    pub next_visit: Option<String>,
    pub pet_id: Option<String>,
    pub doctor_id: Option<String>,
    /// RFC 3339
    pub scheduled_at: Option<String>,
}

impl FfiReservation {
    fn from_record(record: &ReservationRecord, locale: DisplayLocale) -> Self {
        Self {
            id: record.id.value.clone(),
            id_origin: record.id.origin,
            pet_name: record.pet_name.clone(),
            doctor_name: record.doctor_name.clone(),
            date: record.date.clone(),
            time: record.time.clone(),
            status: record.status,
            status_label: record.status.label(locale).to_string(),
            notes: record.notes.clone(),
            species: record.species.clone(),
            breed: record.breed.clone(),
            age: record.age.clone(),
            phone: record.phone.clone(),
            last_visit: record.last_visit.clone(),
            next_visit: record.next_visit.clone(),
            pet_id: record.pet_id.clone(),
            doctor_id: record.doctor_id.clone(),
            scheduled_at: record.scheduled_at.map(|t| t.to_rfc3339()),
        }
    }
}

impl From<FfiReservation> for ReservationRecord {
    fn from(r: FfiReservation) -> Self {
        ReservationRecord {
            id: ReservationId {
                value: r.id,
                origin: r.id_origin,
            },
            pet_name: r.pet_name,
            doctor_name: r.doctor_name,
            date: r.date,
            time: r.time,
            status: r.status,
            notes: r.notes,
            species: r.species,
            breed: r.breed,
            age: r.age,
            phone: r.phone,
            last_visit: r.last_visit,
            next_visit: r.next_visit,
            pet_id: r.pet_id,
            doctor_id: r.doctor_id,
            scheduled_at: r
                .scheduled_at
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|t| t.with_timezone(&Utc)),
        }
    }
}

/// FFI-safe reservation list.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReservationList {
    pub active: Vec<FfiReservation>,
    pub completed: Vec<FfiReservation>,
    /// Whether this differs from the previously shown list.
    pub changed: bool,
    pub fetched_at: String,
}

impl FfiReservationList {
    fn from_list(list: &ReservationList, changed: bool, locale: DisplayLocale) -> Self {
        let convert = |records: &[ReservationRecord]| {
            records
                .iter()
                .map(|r| FfiReservation::from_record(r, locale))
                .collect()
        };
        Self {
            active: convert(&list.active),
            completed: convert(&list.completed),
            changed,
            fetched_at: list.fetched_at.to_rfc3339(),
        }
    }
}

/// FFI-safe detail request.
#[derive(Debug, Clone, uniffi::Enum)]
pub enum FfiDetailRequest {
    ById { id: String },
    Partial { reservation: FfiReservation },
    Fallback { reservation: FfiReservation },
}

impl From<FfiDetailRequest> for DetailRequest {
    fn from(request: FfiDetailRequest) -> Self {
        match request {
            FfiDetailRequest::ById { id } => DetailRequest::ById(id),
            FfiDetailRequest::Partial { reservation } => DetailRequest::Partial(reservation.into()),
            FfiDetailRequest::Fallback { reservation } => {
                DetailRequest::Fallback(reservation.into())
            }
        }
    }
}

/// FFI-safe detail state.
#[derive(Debug, Clone, uniffi::Enum)]
pub enum FfiDetailState {
    Idle,
    Loading,
    Success { reservation: FfiReservation },
    Enriching { reservation: FfiReservation },
    Enriched { reservation: FfiReservation },
    Error { failure: DetailFailure, message: String },
    Closed,
}

impl FfiDetailState {
    fn from_state(state: &DetailState, locale: DisplayLocale) -> Self {
        let convert = |r: &ReservationRecord| FfiReservation::from_record(r, locale);
        match state {
            DetailState::Idle => FfiDetailState::Idle,
            DetailState::Loading => FfiDetailState::Loading,
            DetailState::Success(r) => FfiDetailState::Success { reservation: convert(r) },
            DetailState::Enriching(r) => FfiDetailState::Enriching { reservation: convert(r) },
            DetailState::Enriched(r) => FfiDetailState::Enriched { reservation: convert(r) },
            DetailState::Error { failure, message } => FfiDetailState::Error {
                failure: *failure,
                message: message.clone(),
            },
            DetailState::Closed => FfiDetailState::Closed,
        }
    }
}

/// FFI-safe status override.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStatusOverride {
    pub appointment_id: String,
    pub status: String,
    pub timestamp: String,
    pub synced: bool,
}

impl FfiStatusOverride {
    fn new(appointment_id: String, entry: LocalStatusOverride) -> Self {
        Self {
            appointment_id,
            status: entry.status,
            timestamp: entry.timestamp,
            synced: entry.synced,
        }
    }
}

/// FFI-safe sync failure.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSyncFailure {
    pub appointment_id: String,
    pub message: String,
}

/// FFI-safe sync report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSyncReport {
    pub pushed: Vec<String>,
    pub failed: Vec<FfiSyncFailure>,
    pub skipped: bool,
}

impl From<SyncReport> for FfiSyncReport {
    fn from(report: SyncReport) -> Self {
        Self {
            pushed: report.pushed,
            failed: report
                .failed
                .into_iter()
                .map(|(appointment_id, message)| FfiSyncFailure {
                    appointment_id,
                    message,
                })
                .collect(),
            skipped: report.skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::record;
    use serde_json::json;
    use std::thread;
    use std::time::Duration;
    use vetbook_api::RawRecord;

    #[test]
    fn test_reservation_survives_ffi_conversion() {
        let original = record("42", Some("2024-12-20T09:00:00Z"));
        let ffi = FfiReservation::from_record(&original, DisplayLocale::Indonesian);
        assert_eq!(ffi.status_label, "Menunggu");

        let back: ReservationRecord = ffi.into();
        assert_eq!(back, original);
    }

    #[test]
    fn test_error_mapping() {
        let auth = ApiError::Unauthorized {
            endpoint: "GET /x".into(),
            status: 401,
        };
        assert!(matches!(
            VetbookError::from(ListError::from(auth)),
            VetbookError::AuthRequired(_)
        ));
        assert!(matches!(
            VetbookError::from(SessionError::NotSignedIn),
            VetbookError::AuthRequired(_)
        ));
        assert!(matches!(
            VetbookError::from(OverrideError::UnstableIdentifier("local-1-abcd".into())),
            VetbookError::InvalidInput(_)
        ));
    }

    /// Serves one customer list after `delay` and appointment "7".
    struct SlowBackend {
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl ClinicBackend for SlowBackend {
        async fn user_appointments(
            &self,
            _: &AccessToken,
            _: &str,
        ) -> Result<Vec<RawRecord>, ApiError> {
            tokio::time::sleep(self.delay).await;
            Ok(RawRecord::from_value(
                json!({"id": "1", "pet_name": "Milo", "date": "2024-12-20T09:00:00Z"}),
            )
            .into_iter()
            .collect())
        }

        async fn doctor_appointments(
            &self,
            _: &AccessToken,
            _: &str,
        ) -> Result<Vec<RawRecord>, ApiError> {
            Ok(Vec::new())
        }

        async fn appointment_details(
            &self,
            _: &AccessToken,
            id: &str,
        ) -> Result<RawRecord, ApiError> {
            RawRecord::from_value(json!({
                "appointment_id": id,
                "pet_name": "Milo",
                "doctor_name": "Dr. Sari",
                "species": "Cat",
                "breed": "Persian",
                "phone": "0812"
            }))
            .ok_or(ApiError::NotFound {
                endpoint: format!("GET /appointment/details/{id}"),
            })
        }

        async fn pet_detail(&self, _: &AccessToken, id: &str) -> Result<RawRecord, ApiError> {
            Err(ApiError::NotFound {
                endpoint: format!("GET /pet/detail/{id}"),
            })
        }

        async fn doctor_detail(&self, _: &AccessToken, id: &str) -> Result<RawRecord, ApiError> {
            Err(ApiError::NotFound {
                endpoint: format!("GET /doctor/detail/{id}"),
            })
        }

        async fn update_appointment_status(
            &self,
            _: &AccessToken,
            _: &str,
            _: &str,
        ) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn signed_in_core(delay: Duration) -> Arc<VetbookCore> {
        let core = VetbookCore::with_backend(
            Database::open_in_memory().unwrap(),
            Arc::new(SlowBackend { delay }),
            CoreConfig::default(),
        )
        .unwrap();
        core.sign_in("tok".into(), None, Some("u-1".into())).unwrap();
        Arc::new(core)
    }

    fn refresh_in_background(
        core: &Arc<VetbookCore>,
    ) -> thread::JoinHandle<Result<Option<FfiReservationList>, VetbookError>> {
        let core = Arc::clone(core);
        let handle = thread::spawn(move || core.refresh_reservations(ListAudience::Customer));
        thread::sleep(Duration::from_millis(100));
        handle
    }

    #[test]
    fn test_close_list_discards_in_flight_refresh() {
        let core = signed_in_core(Duration::from_millis(500));

        let refresh = refresh_in_background(&core);
        core.close_list(ListAudience::Customer).unwrap();

        assert!(refresh.join().unwrap().unwrap().is_none());
        assert!(core.cached_reservations(ListAudience::Customer).unwrap().is_none());

        let reopened = core
            .refresh_reservations(ListAudience::Customer)
            .unwrap()
            .unwrap();
        assert_eq!(reopened.active.len(), 1);
    }

    #[test]
    fn test_sign_out_cancels_refresh_and_resets_detail() {
        let core = signed_in_core(Duration::from_millis(500));
        let opened = core
            .open_detail(FfiDetailRequest::ById { id: "7".into() })
            .unwrap();
        assert!(matches!(opened, FfiDetailState::Success { .. }));

        let refresh = refresh_in_background(&core);
        core.sign_out().unwrap();

        assert!(refresh.join().unwrap().unwrap().is_none());
        assert!(!core.is_signed_in().unwrap());
        assert!(matches!(core.detail_state().unwrap(), FfiDetailState::Idle));
        assert!(core.cached_reservations(ListAudience::Customer).unwrap().is_none());
    }

    #[test]
    fn test_in_memory_core_opens() {
        let core = open_core_in_memory("http://127.0.0.1:9/v1/api".into()).unwrap();
        assert!(core.health_check().unwrap());
        assert!(!core.is_signed_in().unwrap());
        assert!(matches!(
            core.refresh_reservations(ListAudience::Customer),
            Err(VetbookError::AuthRequired(_))
        ));
    }
}
