//! Reservation display model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::status::DisplayStatus;

/// Where a reservation identifier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
pub enum IdOrigin {
    /// Read from the backend record; stable across fetches.
    Backend,
    /// Generated locally because the backend omitted every id field.
    /// Changes on every fetch, so it must not key persisted state.
    Synthesized,
}

/// Reservation identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationId {
    pub value: String,
    pub origin: IdOrigin,
}

impl ReservationId {
    pub fn backend(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            origin: IdOrigin::Backend,
        }
    }

    /// Generate a fallback id: `local-<unix millis>-<8 hex chars>`.
    pub fn synthesize() -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self {
            value: format!("local-{}-{}", Utc::now().timestamp_millis(), &suffix[..8]),
            origin: IdOrigin::Synthesized,
        }
    }

    pub fn is_stable(&self) -> bool {
        self.origin == IdOrigin::Backend
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for ReservationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

/// Display-ready reservation, rebuilt on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationRecord {
    pub id: ReservationId,
    pub pet_name: String,
    pub doctor_name: String,
    /// Formatted date, or the raw source when it could not be parsed.
    pub date: String,
    /// Formatted `HH.MM` time.
    pub time: String,
    pub status: DisplayStatus,
    pub notes: String,
    pub species: String,
    pub breed: String,
    pub age: String,
    pub phone: String,
    pub last_visit: Option<String>,
    pub next_visit: Option<String>,
    pub pet_id: Option<String>,
    pub doctor_id: Option<String>,
    /// Sort key; `None` when the source date was not a timestamp.
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl ReservationRecord {
    /// Fields the detail screen enriches, paired with their current values.
    pub fn enrichable_fields(&self) -> [&str; 5] {
        [
            self.pet_name.as_str(),
            self.doctor_name.as_str(),
            self.species.as_str(),
            self.breed.as_str(),
            self.phone.as_str(),
        ]
    }

    /// Whether any enrichable field still shows the placeholder.
    pub fn needs_enrichment(&self, placeholder: &str) -> bool {
        self.enrichable_fields().iter().any(|v| *v == placeholder)
    }

    /// Take values from `shown` wherever this record has nothing better.
    ///
    /// A refetch never blanks a field the screen already displays.
    pub fn keep_shown(&mut self, shown: &ReservationRecord, placeholder: &str) {
        if !self.id.is_stable() {
            self.id = shown.id.clone();
        }
        if self.scheduled_at.is_none() && shown.scheduled_at.is_some() {
            self.date = shown.date.clone();
            self.time = shown.time.clone();
            self.scheduled_at = shown.scheduled_at;
        }
        for (slot, kept) in [
            (&mut self.pet_name, &shown.pet_name),
            (&mut self.doctor_name, &shown.doctor_name),
            (&mut self.species, &shown.species),
            (&mut self.breed, &shown.breed),
            (&mut self.age, &shown.age),
            (&mut self.phone, &shown.phone),
            (&mut self.date, &shown.date),
            (&mut self.time, &shown.time),
        ] {
            if slot.as_str() == placeholder && kept.as_str() != placeholder {
                slot.clone_from(kept);
            }
        }
        if self.notes.is_empty() {
            self.notes.clone_from(&shown.notes);
        }
        for (slot, kept) in [
            (&mut self.last_visit, &shown.last_visit),
            (&mut self.next_visit, &shown.next_visit),
            (&mut self.pet_id, &shown.pet_id),
            (&mut self.doctor_id, &shown.doctor_id),
        ] {
            if slot.is_none() {
                slot.clone_from(kept);
            }
        }
    }
}

/// Order reservations newest first. Records without a timestamp go last;
/// ties keep their fetch order.
pub fn sort_newest_first(records: &mut [ReservationRecord]) {
    records.sort_by(|a, b| match (a.scheduled_at, b.scheduled_at) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

/// SHA-256 over the canonical JSON of a record list.
///
/// Used to tell the host whether a refresh changed what is on screen.
pub fn fingerprint(records: &[ReservationRecord]) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(records)?;
    Ok(hex::encode(Sha256::digest(json.as_bytes())))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn record(id: &str, scheduled_at: Option<&str>) -> ReservationRecord {
        ReservationRecord {
            id: ReservationId::backend(id),
            pet_name: "Milo".into(),
            doctor_name: "Dr. Sari".into(),
            date: "date".into(),
            time: "time".into(),
            status: DisplayStatus::Pending,
            notes: String::new(),
            species: "Cat".into(),
            breed: "Persian".into(),
            age: "3".into(),
            phone: "0812".into(),
            last_visit: None,
            next_visit: None,
            pet_id: None,
            doctor_id: None,
            scheduled_at: scheduled_at.map(|s| s.parse().unwrap()),
        }
    }
}
