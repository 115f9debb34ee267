//! Reservation normalizer.
//!
//! Turns one raw appointment (plus optional pet and doctor detail records)
//! into a [`ReservationRecord`]:
//! - identifier from the declared id aliases, synthesized when all are missing
//! - status from the local override when one exists, else the raw status
//! - descriptive fields from detail record → appointment → placeholder
//! - date and time from a single source timestamp

pub mod aliases;
mod datetime;

pub use datetime::*;

use thiserror::Error;
use vetbook_api::RawRecord;

use crate::config::CoreConfig;
use crate::models::{map_status, DisplayStatus, OverrideMap, ReservationId, ReservationRecord};
use aliases::FieldAliases;

/// Normalizer errors.
#[derive(Error, Debug, PartialEq)]
pub enum NormalizeError {
    #[error("No appointment record to normalize")]
    MissingAppointment,
}

pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// Raw records for one reservation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeInput<'a> {
    pub appointment: Option<&'a RawRecord>,
    pub pet: Option<&'a RawRecord>,
    pub doctor: Option<&'a RawRecord>,
}

impl<'a> NormalizeInput<'a> {
    pub fn appointment(appointment: &'a RawRecord) -> Self {
        Self {
            appointment: Some(appointment),
            pet: None,
            doctor: None,
        }
    }

    pub fn with_pet(mut self, pet: Option<&'a RawRecord>) -> Self {
        self.pet = pet;
        self
    }

    pub fn with_doctor(mut self, doctor: Option<&'a RawRecord>) -> Self {
        self.doctor = doctor;
        self
    }
}

/// Normalizer for raw appointment records.
#[derive(Debug, Clone)]
pub struct Normalizer {
    formatter: DateFormatter,
    placeholder: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(&CoreConfig::default())
    }
}

impl Normalizer {
    /// Create a normalizer from configuration.
    pub fn new(config: &CoreConfig) -> Self {
        Self {
            formatter: DateFormatter::new(config.locale, config.utc_offset_minutes),
            placeholder: config.placeholder.clone(),
        }
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn formatter(&self) -> &DateFormatter {
        &self.formatter
    }

    /// Normalize one reservation.
    pub fn normalize(
        &self,
        input: NormalizeInput<'_>,
        overrides: &OverrideMap,
    ) -> NormalizeResult<ReservationRecord> {
        let appointment = input.appointment.ok_or(NormalizeError::MissingAppointment)?;
        Ok(self.normalize_appointment(appointment, input.pet, input.doctor, overrides))
    }

    /// Normalize when the appointment is known to be present.
    pub fn normalize_appointment(
        &self,
        appointment: &RawRecord,
        pet: Option<&RawRecord>,
        doctor: Option<&RawRecord>,
        overrides: &OverrideMap,
    ) -> ReservationRecord {
        let id = Self::resolve_id(appointment);
        let status = Self::resolve_status(&id, appointment, overrides);

        let date_source = appointment.first_of(aliases::DATE);
        let formatted = date_source
            .as_deref()
            .and_then(|raw| self.formatter.format(raw));

        let (date, time, scheduled_at) = match formatted {
            Some(f) => {
                let time = f.time.unwrap_or_else(|| self.raw_time(appointment));
                (f.date, time, Some(f.instant))
            }
            None => {
                if let Some(raw) = &date_source {
                    tracing::debug!(
                        reservation_id = %id,
                        raw = raw.as_str(),
                        "date is not a timestamp, passing through"
                    );
                }
                (
                    date_source.unwrap_or_else(|| self.placeholder.clone()),
                    self.raw_time(appointment),
                    None,
                )
            }
        };

        ReservationRecord {
            pet_name: self.field_or_placeholder(&aliases::PET_NAME, pet, appointment),
            doctor_name: self.field_or_placeholder(&aliases::DOCTOR_NAME, doctor, appointment),
            date,
            time,
            status,
            notes: appointment.first_of(aliases::NOTES).unwrap_or_default(),
            species: self.field_or_placeholder(&aliases::SPECIES, pet, appointment),
            breed: self.field_or_placeholder(&aliases::BREED, pet, appointment),
            age: self.field_or_placeholder(&aliases::AGE, pet, appointment),
            phone: self.field_or_placeholder(&aliases::PHONE, pet, appointment),
            last_visit: Self::resolve_field(&aliases::LAST_VISIT, pet, appointment)
                .map(|raw| self.formatter.format_date(&raw)),
            next_visit: Self::resolve_field(&aliases::NEXT_VISIT, pet, appointment)
                .map(|raw| self.formatter.format_date(&raw)),
            pet_id: appointment.first_of(aliases::PET_ID),
            doctor_id: appointment.first_of(aliases::DOCTOR_ID),
            scheduled_at,
            id,
        }
    }

    /// Backend id from the alias list, or a synthesized fallback.
    pub fn resolve_id(appointment: &RawRecord) -> ReservationId {
        match appointment.first_of(aliases::APPOINTMENT_ID) {
            Some(id) => ReservationId::backend(id),
            None => {
                let id = ReservationId::synthesize();
                tracing::warn!(
                    synthesized_id = %id,
                    "appointment has no id field, local overrides will not apply"
                );
                id
            }
        }
    }

    /// Override status for stable ids, else the raw status, else `Pending`.
    pub fn resolve_status(
        id: &ReservationId,
        appointment: &RawRecord,
        overrides: &OverrideMap,
    ) -> DisplayStatus {
        if id.is_stable() {
            if let Some(local) = overrides.get(id.as_str()) {
                return map_status(&local.status);
            }
        }
        appointment
            .first_of(aliases::STATUS)
            .map(|s| map_status(&s))
            .unwrap_or(DisplayStatus::Pending)
    }

    /// First value from the enrichment record, then the appointment.
    pub fn resolve_field(
        aliases: &FieldAliases,
        enrichment: Option<&RawRecord>,
        appointment: &RawRecord,
    ) -> Option<String> {
        enrichment
            .and_then(|record| record.first_of(aliases.enrichment))
            .or_else(|| appointment.first_of(aliases.appointment))
    }

    fn field_or_placeholder(
        &self,
        aliases: &FieldAliases,
        enrichment: Option<&RawRecord>,
        appointment: &RawRecord,
    ) -> String {
        Self::resolve_field(aliases, enrichment, appointment)
            .unwrap_or_else(|| self.placeholder.clone())
    }

    fn raw_time(&self, appointment: &RawRecord) -> String {
        appointment
            .first_of(aliases::TIME)
            .unwrap_or_else(|| self.placeholder.clone())
    }

    /// Fill placeholder fields of an already-built record from detail
    /// records. Used when only a partial record is available and the full
    /// appointment could not be fetched; fields that already hold a value
    /// are left alone.
    pub fn apply_enrichment(
        &self,
        record: &mut ReservationRecord,
        pet: Option<&RawRecord>,
        doctor: Option<&RawRecord>,
    ) {
        let fill = |slot: &mut String, aliases: &FieldAliases, source: Option<&RawRecord>| {
            if *slot == self.placeholder {
                if let Some(value) = source.and_then(|r| r.first_of(aliases.enrichment)) {
                    *slot = value;
                }
            }
        };

        fill(&mut record.pet_name, &aliases::PET_NAME, pet);
        fill(&mut record.doctor_name, &aliases::DOCTOR_NAME, doctor);
        fill(&mut record.species, &aliases::SPECIES, pet);
        fill(&mut record.breed, &aliases::BREED, pet);
        fill(&mut record.age, &aliases::AGE, pet);
        fill(&mut record.phone, &aliases::PHONE, pet);

        if record.last_visit.is_none() {
            record.last_visit = pet
                .and_then(|r| r.first_of(aliases::LAST_VISIT.enrichment))
                .map(|raw| self.formatter.format_date(&raw));
        }
        if record.next_visit.is_none() {
            record.next_visit = pet
                .and_then(|r| r.first_of(aliases::NEXT_VISIT.enrichment))
                .map(|raw| self.formatter.format_date(&raw));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LocalStatusOverride;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawRecord {
        RawRecord::from_value(value).unwrap()
    }

    #[test]
    fn test_missing_appointment_is_error() {
        let normalizer = Normalizer::default();
        let result = normalizer.normalize(NormalizeInput::default(), &OverrideMap::new());
        assert_eq!(result.unwrap_err(), NormalizeError::MissingAppointment);
    }

    #[test]
    fn test_id_alias_priority() {
        let rec = raw(json!({"id": "b", "appointment_id": "a", "_id": "c"}));
        assert_eq!(Normalizer::resolve_id(&rec), ReservationId::backend("a"));

        let rec = raw(json!({"_id": "c", "appointmentId": "d"}));
        assert_eq!(Normalizer::resolve_id(&rec), ReservationId::backend("c"));

        let rec = raw(json!({"appointment_id": 12}));
        assert_eq!(Normalizer::resolve_id(&rec).value, "12");
    }

    #[test]
    fn test_enrichment_beats_appointment_fields() {
        let normalizer = Normalizer::default();
        let appt = raw(json!({
            "appointment_id": "1",
            "pet_name": "FromAppointment",
            "pet_breed": "Mixed",
            "doctor_name": "Dr. Appointment"
        }));
        let pet = raw(json!({"pet_name": "FromPet", "species": "Dog"}));
        let doctor = raw(json!({"name": "Dr. Detail"}));

        let rec = normalizer
            .normalize(
                NormalizeInput::appointment(&appt)
                    .with_pet(Some(&pet))
                    .with_doctor(Some(&doctor)),
                &OverrideMap::new(),
            )
            .unwrap();

        assert_eq!(rec.pet_name, "FromPet");
        assert_eq!(rec.doctor_name, "Dr. Detail");
        assert_eq!(rec.species, "Dog");
        // pet record has no breed, so the appointment's value is used
        assert_eq!(rec.breed, "Mixed");
        assert_eq!(rec.age, "Unknown");
    }

    #[test]
    fn test_override_ignored_for_synthesized_id() {
        let normalizer = Normalizer::default();
        let appt = raw(json!({"status": "Completed"}));
        let rec = normalizer
            .normalize(NormalizeInput::appointment(&appt), &OverrideMap::new())
            .unwrap();
        assert!(!rec.id.is_stable());
        assert_eq!(rec.status, DisplayStatus::Completed);

        let mut overrides = OverrideMap::new();
        overrides.insert(rec.id.value.clone(), LocalStatusOverride::new("Rejected"));
        assert_eq!(
            Normalizer::resolve_status(&rec.id, &appt, &overrides),
            DisplayStatus::Completed
        );
    }

    #[test]
    fn test_unparseable_date_passes_through_with_raw_time() {
        let normalizer = Normalizer::default();
        let appt = raw(json!({
            "appointment_id": "1",
            "date": "Jumat, 20 Desember 2024",
            "time": "09.00"
        }));
        let rec = normalizer
            .normalize(NormalizeInput::appointment(&appt), &OverrideMap::new())
            .unwrap();
        assert_eq!(rec.date, "Jumat, 20 Desember 2024");
        assert_eq!(rec.time, "09.00");
        assert!(rec.scheduled_at.is_none());
    }

    #[test]
    fn test_missing_date_uses_placeholder() {
        let normalizer = Normalizer::default();
        let appt = raw(json!({"appointment_id": "1"}));
        let rec = normalizer
            .normalize(NormalizeInput::appointment(&appt), &OverrideMap::new())
            .unwrap();
        assert_eq!(rec.date, "Unknown");
        assert_eq!(rec.time, "Unknown");
        assert_eq!(rec.status, DisplayStatus::Pending);
        assert_eq!(rec.notes, "");
    }

    #[test]
    fn test_visit_dates_are_formatted() {
        let normalizer = Normalizer::default();
        let appt = raw(json!({"appointment_id": "1"}));
        let pet = raw(json!({"lastVisit": "2024-11-02", "nextAppointment": "soon"}));
        let rec = normalizer
            .normalize(
                NormalizeInput::appointment(&appt).with_pet(Some(&pet)),
                &OverrideMap::new(),
            )
            .unwrap();
        assert_eq!(rec.last_visit.as_deref(), Some("Saturday, 2 November 2024"));
        assert_eq!(rec.next_visit.as_deref(), Some("soon"));
    }

    #[test]
    fn test_apply_enrichment_only_fills_placeholders() {
        let normalizer = Normalizer::default();
        let appt = raw(json!({"appointment_id": "1", "pet_name": "Milo"}));
        let mut rec = normalizer
            .normalize(NormalizeInput::appointment(&appt), &OverrideMap::new())
            .unwrap();

        let pet = raw(json!({"pet_name": "Other", "species": "Cat", "breed": "Persian"}));
        let doctor = raw(json!({"name": "Dr. Sari"}));
        normalizer.apply_enrichment(&mut rec, Some(&pet), Some(&doctor));

        assert_eq!(rec.pet_name, "Milo");
        assert_eq!(rec.species, "Cat");
        assert_eq!(rec.breed, "Persian");
        assert_eq!(rec.doctor_name, "Dr. Sari");
        assert_eq!(rec.phone, "Unknown");
    }
}
