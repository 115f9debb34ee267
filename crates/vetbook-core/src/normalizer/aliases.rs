//! Declared field-name aliases.
//!
//! Each list is tried in order and the first non-empty value wins. Fields
//! that can also come from a pet or doctor detail record list those
//! aliases separately; the detail record is consulted first.

/// Alias lists for a field that has an enrichment source.
#[derive(Debug, Clone, Copy)]
pub struct FieldAliases {
    /// Keys in the pet/doctor detail record.
    pub enrichment: &'static [&'static str],
    /// Keys in the appointment record itself.
    pub appointment: &'static [&'static str],
}

pub const APPOINTMENT_ID: &[&str] = &["appointment_id", "id", "_id", "appointmentId"];
pub const STATUS: &[&str] = &["status", "appointment_status"];
pub const DATE: &[&str] = &["date", "appointment_date", "datetime", "scheduled_at"];
pub const TIME: &[&str] = &["time", "appointment_time"];
pub const NOTES: &[&str] = &["notes", "note", "description"];
pub const PET_ID: &[&str] = &["pet_id", "petId"];
pub const DOCTOR_ID: &[&str] = &["doctor_id", "doctorId"];

pub const PET_NAME: FieldAliases = FieldAliases {
    enrichment: &["pet_name", "name"],
    appointment: &["pet_name", "petName"],
};

pub const DOCTOR_NAME: FieldAliases = FieldAliases {
    enrichment: &["name", "doctor_name"],
    appointment: &["doctor_name", "doctorName"],
};

pub const SPECIES: FieldAliases = FieldAliases {
    enrichment: &["species", "pet_species"],
    appointment: &["pet_species", "species"],
};

pub const BREED: FieldAliases = FieldAliases {
    enrichment: &["breed", "pet_breed"],
    appointment: &["pet_breed", "breed"],
};

pub const AGE: FieldAliases = FieldAliases {
    enrichment: &["age", "pet_age"],
    appointment: &["pet_age", "age"],
};

pub const PHONE: FieldAliases = FieldAliases {
    enrichment: &["phone", "owner_phone"],
    appointment: &["phone", "owner_phone"],
};

pub const LAST_VISIT: FieldAliases = FieldAliases {
    enrichment: &["lastVisit", "last_visit"],
    appointment: &["last_visit", "lastVisit"],
};

pub const NEXT_VISIT: FieldAliases = FieldAliases {
    enrichment: &["nextAppointment", "next_appointment"],
    appointment: &["next_appointment", "nextAppointment"],
};
