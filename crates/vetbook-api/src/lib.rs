//! HTTP client for the veterinary clinic appointment API.
//!
//! The remote API is treated as an opaque collaborator. This crate owns the
//! transport (bearer auth, timeouts, transport retries), the response
//! envelope decoding and the error classification. Record fields are left
//! untyped ([`RawRecord`]) because field names drift between endpoints; the
//! core crate resolves them through declared alias lists.
//!
//! All paths are relative to the configured base URL, e.g.
//! `https://clinic.example/v1/api/appointment/user/{userId}`.

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub(crate) mod retry;
pub mod types;

pub use client::{ClinicBackend, ClinicClient};
pub use config::{ApiConfig, ConfigError};
pub use envelope::{decode_appointment_list, decode_record, RecordKind};
pub use error::{ApiError, ErrorKind};
pub use types::{AccessToken, RawRecord, StatusUpdateRequest};
