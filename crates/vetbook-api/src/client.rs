//! Typed client for the clinic REST API.
//!
//! ## Endpoints
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/appointment/user/{userId}` | Customer appointments |
//! | GET    | `/appointment/doctor/{doctorId}` | Doctor appointments |
//! | GET    | `/appointment/details/{id}` | Single appointment |
//! | GET    | `/pet/detail/{petId}` | Pet detail |
//! | GET    | `/doctor/detail/{doctorId}` | Doctor detail |
//! | PUT    | `/appointment/update/update/{id}` | Appointment status update |

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::Instrument;
use url::Url;

use crate::config::{ApiConfig, ConfigError};
use crate::envelope::{decode_appointment_list, decode_record, RecordKind};
use crate::error::ApiError;
use crate::types::{AccessToken, RawRecord, StatusUpdateRequest};

/// The operations the reservation core needs from the remote API.
///
/// Implemented by [`ClinicClient`]; tests substitute in-memory fakes.
#[async_trait]
pub trait ClinicBackend: Send + Sync {
    /// Appointments booked by a customer.
    async fn user_appointments(
        &self,
        token: &AccessToken,
        user_id: &str,
    ) -> Result<Vec<RawRecord>, ApiError>;

    /// Appointments assigned to a doctor.
    async fn doctor_appointments(
        &self,
        token: &AccessToken,
        doctor_id: &str,
    ) -> Result<Vec<RawRecord>, ApiError>;

    /// A single appointment by id.
    async fn appointment_details(
        &self,
        token: &AccessToken,
        appointment_id: &str,
    ) -> Result<RawRecord, ApiError>;

    /// Pet detail by id.
    async fn pet_detail(&self, token: &AccessToken, pet_id: &str) -> Result<RawRecord, ApiError>;

    /// Doctor detail by id.
    async fn doctor_detail(
        &self,
        token: &AccessToken,
        doctor_id: &str,
    ) -> Result<RawRecord, ApiError>;

    /// Push a status change for an appointment.
    async fn update_appointment_status(
        &self,
        token: &AccessToken,
        appointment_id: &str,
        status: &str,
    ) -> Result<(), ApiError>;
}

/// HTTP implementation of [`ClinicBackend`].
#[derive(Debug, Clone)]
pub struct ClinicClient {
    http: reqwest::Client,
    base_url: Url,
    max_retries: u32,
}

impl ClinicClient {
    /// Create a client from configuration.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            http,
            base_url: config.base_url,
            max_retries: config.max_retries,
        })
    }

    /// Build `{base_url}/{segments...}` with each segment percent-encoded.
    fn endpoint_url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ConfigError::InvalidUrl(self.base_url.to_string(), "URL cannot be a base".into())
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    async fn get_json(
        &self,
        endpoint: &str,
        segments: &[&str],
        token: &AccessToken,
    ) -> Result<Value, ApiError> {
        let url = self.endpoint_url(segments)?;

        let resp = crate::retry::send_with_retry(endpoint, self.max_retries, || {
            self.http
                .get(url.clone())
                .bearer_auth(token.as_str())
                .send()
        })
        .await
        .map_err(|e| ApiError::Http {
            endpoint: endpoint.into(),
            source: e,
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read response body: {e}>"));
            tracing::debug!(endpoint, status = status.as_u16(), "clinic API request rejected");
            return Err(ApiError::from_status(endpoint, status.as_u16(), body));
        }

        resp.json().await.map_err(|e| ApiError::Deserialization {
            endpoint: endpoint.into(),
            source: e,
        })
    }

    async fn get_list(
        &self,
        endpoint: &str,
        segments: &[&str],
        token: &AccessToken,
    ) -> Result<Vec<RawRecord>, ApiError> {
        let body = self.get_json(endpoint, segments, token).await?;
        let records = decode_appointment_list(body).map_err(|message| ApiError::Contract {
            endpoint: endpoint.into(),
            message,
        })?;
        tracing::debug!(endpoint, count = records.len(), "fetched appointment list");
        Ok(records)
    }

    async fn get_record(
        &self,
        endpoint: &str,
        segments: &[&str],
        token: &AccessToken,
        kind: RecordKind,
    ) -> Result<RawRecord, ApiError> {
        let body = self.get_json(endpoint, segments, token).await?;
        decode_record(body, kind).map_err(|message| ApiError::Contract {
            endpoint: endpoint.into(),
            message,
        })
    }
}

#[async_trait]
impl ClinicBackend for ClinicClient {
    async fn user_appointments(
        &self,
        token: &AccessToken,
        user_id: &str,
    ) -> Result<Vec<RawRecord>, ApiError> {
        let endpoint = format!("GET /appointment/user/{user_id}");
        self.get_list(&endpoint, &["appointment", "user", user_id], token)
            .await
    }

    async fn doctor_appointments(
        &self,
        token: &AccessToken,
        doctor_id: &str,
    ) -> Result<Vec<RawRecord>, ApiError> {
        let endpoint = format!("GET /appointment/doctor/{doctor_id}");
        self.get_list(&endpoint, &["appointment", "doctor", doctor_id], token)
            .await
    }

    async fn appointment_details(
        &self,
        token: &AccessToken,
        appointment_id: &str,
    ) -> Result<RawRecord, ApiError> {
        let endpoint = format!("GET /appointment/details/{appointment_id}");
        self.get_record(
            &endpoint,
            &["appointment", "details", appointment_id],
            token,
            RecordKind::Appointment,
        )
        .await
    }

    async fn pet_detail(&self, token: &AccessToken, pet_id: &str) -> Result<RawRecord, ApiError> {
        let endpoint = format!("GET /pet/detail/{pet_id}");
        self.get_record(&endpoint, &["pet", "detail", pet_id], token, RecordKind::Pet)
            .await
    }

    async fn doctor_detail(
        &self,
        token: &AccessToken,
        doctor_id: &str,
    ) -> Result<RawRecord, ApiError> {
        let endpoint = format!("GET /doctor/detail/{doctor_id}");
        self.get_record(
            &endpoint,
            &["doctor", "detail", doctor_id],
            token,
            RecordKind::Doctor,
        )
        .await
    }

    async fn update_appointment_status(
        &self,
        token: &AccessToken,
        appointment_id: &str,
        status: &str,
    ) -> Result<(), ApiError> {
        let endpoint = format!("PUT /appointment/update/update/{appointment_id}");
        let url = self.endpoint_url(&["appointment", "update", "update", appointment_id])?;
        let body = StatusUpdateRequest {
            status: status.to_string(),
        };

        let resp = crate::retry::send_with_retry(&endpoint, self.max_retries, || {
            self.http
                .put(url.clone())
                .bearer_auth(token.as_str())
                .json(&body)
                .send()
        })
        .instrument(tracing::info_span!("status_update", appointment_id, status))
        .await
        .map_err(|e| ApiError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        let code = resp.status();
        if !code.is_success() {
            let text = resp
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read response body: {e}>"));
            return Err(ApiError::from_status(&endpoint, code.as_u16(), text));
        }

        tracing::info!(appointment_id, status, "appointment status pushed to backend");
        Ok(())
    }
}
