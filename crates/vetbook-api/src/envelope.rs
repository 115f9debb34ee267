//! Response envelope decoding.
//!
//! The appointment list endpoints answer with a bare array,
//! `{"appointments": [...]}` or `{"data": [...]}` depending on the endpoint
//! and backend version. Single-record endpoints answer with the bare object
//! or wrap it in `{"data": {...}}` / `{"<kind>": {...}}`. Anything else is a
//! contract violation and is reported, never defaulted to empty.

use serde::Deserialize;
use serde_json::Value;

use crate::types::RawRecord;

/// Known shapes of an appointment collection response.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AppointmentListEnvelope {
    Bare(Vec<Value>),
    Appointments { appointments: Vec<Value> },
    Data { data: Vec<Value> },
}

impl AppointmentListEnvelope {
    fn into_items(self) -> Vec<Value> {
        match self {
            AppointmentListEnvelope::Bare(items)
            | AppointmentListEnvelope::Appointments {
                appointments: items,
            }
            | AppointmentListEnvelope::Data { data: items } => items,
        }
    }
}

/// Decode an appointment collection. Every item must be a JSON object.
pub fn decode_appointment_list(body: Value) -> Result<Vec<RawRecord>, String> {
    let envelope: AppointmentListEnvelope = serde_json::from_value(body)
        .map_err(|_| "expected an array, {appointments: [...]} or {data: [...]}".to_string())?;

    envelope
        .into_items()
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            RawRecord::from_value(item)
                .ok_or_else(|| format!("appointment at index {index} is not an object"))
        })
        .collect()
}

/// Which single-record endpoint a body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Appointment,
    Pet,
    Doctor,
}

impl RecordKind {
    fn wrapper_key(self) -> &'static str {
        match self {
            RecordKind::Appointment => "appointment",
            RecordKind::Pet => "pet",
            RecordKind::Doctor => "doctor",
        }
    }
}

/// Keys that may appear next to the payload in a wrapped response.
const ENVELOPE_META_KEYS: &[&str] = &["success", "message", "status", "code"];

/// Decode a single-record response.
pub fn decode_record(body: Value, kind: RecordKind) -> Result<RawRecord, String> {
    let Value::Object(mut map) = body else {
        return Err(format!("expected a {} object", kind.wrapper_key()));
    };

    let is_envelope = |key: &str, map: &serde_json::Map<String, Value>| {
        matches!(map.get(key), Some(Value::Object(_)))
            && map
                .keys()
                .all(|k| k == key || ENVELOPE_META_KEYS.contains(&k.as_str()))
    };

    for key in ["data", kind.wrapper_key()] {
        if is_envelope(key, &map) {
            if let Some(inner) = map.remove(key) {
                return RawRecord::from_value(inner)
                    .ok_or_else(|| format!("{key} is not an object"));
            }
        }
    }

    if map.is_empty() {
        return Err(format!("empty {} object", kind.wrapper_key()));
    }
    Ok(RawRecord::new(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_accepts_all_known_shapes() {
        let item = json!({"appointment_id": "1"});
        for body in [
            json!([item.clone()]),
            json!({"appointments": [item.clone()]}),
            json!({"data": [item.clone()], "message": "ok"}),
        ] {
            let records = decode_appointment_list(body).unwrap();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].text("appointment_id"), Some("1".into()));
        }
    }

    #[test]
    fn test_list_empty_array_is_valid() {
        assert!(decode_appointment_list(json!({"appointments": []}))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_list_unknown_shape_fails_loudly() {
        assert!(decode_appointment_list(json!({"items": []})).is_err());
        assert!(decode_appointment_list(json!({})).is_err());
        assert!(decode_appointment_list(json!("nope")).is_err());
    }

    #[test]
    fn test_list_rejects_non_object_items() {
        let err = decode_appointment_list(json!([{"id": 1}, 2])).unwrap_err();
        assert!(err.contains("index 1"));
    }

    #[test]
    fn test_record_unwraps_known_envelopes() {
        let bare = decode_record(json!({"pet_name": "Milo"}), RecordKind::Pet).unwrap();
        assert_eq!(bare.text("pet_name"), Some("Milo".into()));

        let data = decode_record(
            json!({"success": true, "data": {"pet_name": "Milo"}}),
            RecordKind::Pet,
        )
        .unwrap();
        assert_eq!(data.text("pet_name"), Some("Milo".into()));

        let keyed =
            decode_record(json!({"doctor": {"name": "Dr. Sari"}}), RecordKind::Doctor).unwrap();
        assert_eq!(keyed.text("name"), Some("Dr. Sari".into()));
    }

    #[test]
    fn test_record_keeps_nested_objects_inside_real_records() {
        let rec = decode_record(
            json!({"appointment_id": "5", "doctor": {"name": "Dr. Sari"}}),
            RecordKind::Appointment,
        )
        .unwrap();
        assert_eq!(rec.text("appointment_id"), Some("5".into()));
    }

    #[test]
    fn test_record_rejects_non_objects() {
        assert!(decode_record(json!([]), RecordKind::Appointment).is_err());
        assert!(decode_record(json!({}), RecordKind::Appointment).is_err());
    }
}
