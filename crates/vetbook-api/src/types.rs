//! Wire types shared by the client and its callers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Bearer token for API authentication.
///
/// `Debug` is redacted so tokens never reach log output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the token is blank.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// An untyped JSON object as returned by the API.
///
/// Field names are inconsistent across endpoints, so lookups go through
/// [`RawRecord::first_of`] with an ordered alias list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wrap a JSON value if it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Read a field as display text.
    ///
    /// Strings are trimmed and empty strings count as absent. Numbers and
    /// booleans are rendered with their JSON text. Null, arrays and objects
    /// are absent.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// First present field from an ordered alias list.
    pub fn first_of(&self, aliases: &[&str]) -> Option<String> {
        aliases.iter().find_map(|key| self.text(key))
    }
}

/// Body for `PUT /appointment/update/update/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}
