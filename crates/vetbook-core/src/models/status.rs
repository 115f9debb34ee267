//! Status vocabularies and the mapping between them.
//!
//! The backend speaks `Scheduled | Pending | Confirmed | Completed |
//! Cancelled | Rejected`; screens show four display states. The lookup is
//! case-sensitive: `"confirmed"` is not in the table and shows as
//! `Pending`, matching what the app has always displayed.

use serde::{Deserialize, Serialize};

/// Display locale for labels and dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, uniffi::Enum)]
pub enum DisplayLocale {
    #[default]
    English,
    Indonesian,
}

impl DisplayLocale {
    /// Parse a locale tag such as `en`, `en-US`, `id` or `id_ID`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let lang = tag.split(['-', '_']).next()?.to_ascii_lowercase();
        match lang.as_str() {
            "en" => Some(DisplayLocale::English),
            "id" | "in" => Some(DisplayLocale::Indonesian),
            _ => None,
        }
    }
}

/// User-facing reservation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, uniffi::Enum)]
pub enum DisplayStatus {
    Scheduled,
    Pending,
    Rejected,
    Completed,
}

impl DisplayStatus {
    /// Label shown to the user.
    pub fn label(self, locale: DisplayLocale) -> &'static str {
        match (locale, self) {
            (DisplayLocale::English, DisplayStatus::Scheduled) => "Scheduled",
            (DisplayLocale::English, DisplayStatus::Pending) => "Pending",
            (DisplayLocale::English, DisplayStatus::Rejected) => "Rejected",
            (DisplayLocale::English, DisplayStatus::Completed) => "Completed",
            (DisplayLocale::Indonesian, DisplayStatus::Scheduled) => "Terjadwal",
            (DisplayLocale::Indonesian, DisplayStatus::Pending) => "Menunggu",
            (DisplayLocale::Indonesian, DisplayStatus::Rejected) => "Ditolak",
            (DisplayLocale::Indonesian, DisplayStatus::Completed) => "Selesai",
        }
    }

    /// Backend value written when a doctor picks this status.
    pub fn to_backend(self) -> BackendStatus {
        match self {
            DisplayStatus::Scheduled => BackendStatus::Scheduled,
            DisplayStatus::Pending => BackendStatus::Pending,
            DisplayStatus::Rejected => BackendStatus::Rejected,
            DisplayStatus::Completed => BackendStatus::Completed,
        }
    }

    /// Whether the reservation belongs in the "completed" tab.
    pub fn is_completed(self) -> bool {
        matches!(self, DisplayStatus::Completed)
    }
}

/// Backend status vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, uniffi::Enum)]
pub enum BackendStatus {
    Scheduled,
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Rejected,
}

impl BackendStatus {
    pub const ALL: [BackendStatus; 6] = [
        BackendStatus::Scheduled,
        BackendStatus::Pending,
        BackendStatus::Confirmed,
        BackendStatus::Completed,
        BackendStatus::Cancelled,
        BackendStatus::Rejected,
    ];

    /// Wire spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            BackendStatus::Scheduled => "Scheduled",
            BackendStatus::Pending => "Pending",
            BackendStatus::Confirmed => "Confirmed",
            BackendStatus::Completed => "Completed",
            BackendStatus::Cancelled => "Cancelled",
            BackendStatus::Rejected => "Rejected",
        }
    }

    /// Exact-match parse of the wire spelling.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    pub fn to_display(self) -> DisplayStatus {
        match self {
            BackendStatus::Scheduled | BackendStatus::Confirmed => DisplayStatus::Scheduled,
            BackendStatus::Pending => DisplayStatus::Pending,
            BackendStatus::Completed => DisplayStatus::Completed,
            BackendStatus::Cancelled | BackendStatus::Rejected => DisplayStatus::Rejected,
        }
    }
}

impl std::fmt::Display for BackendStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a raw backend status string to its display status.
///
/// Total: anything outside the table, including other casings, is `Pending`.
pub fn map_status(backend_status: &str) -> DisplayStatus {
    BackendStatus::parse(backend_status)
        .map(BackendStatus::to_display)
        .unwrap_or(DisplayStatus::Pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mapping_table() {
        assert_eq!(map_status("Scheduled"), DisplayStatus::Scheduled);
        assert_eq!(map_status("Confirmed"), DisplayStatus::Scheduled);
        assert_eq!(map_status("Pending"), DisplayStatus::Pending);
        assert_eq!(map_status("Completed"), DisplayStatus::Completed);
        assert_eq!(map_status("Cancelled"), DisplayStatus::Rejected);
        assert_eq!(map_status("Rejected"), DisplayStatus::Rejected);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert_eq!(map_status("confirmed"), DisplayStatus::Pending);
        assert_eq!(map_status("COMPLETED"), DisplayStatus::Pending);
        assert_eq!(map_status(""), DisplayStatus::Pending);
    }

    #[test]
    fn test_display_round_trips_through_backend() {
        for status in [
            DisplayStatus::Scheduled,
            DisplayStatus::Pending,
            DisplayStatus::Rejected,
            DisplayStatus::Completed,
        ] {
            assert_eq!(map_status(status.to_backend().as_str()), status);
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(DisplayStatus::Rejected.label(DisplayLocale::Indonesian), "Ditolak");
        assert_eq!(DisplayStatus::Scheduled.label(DisplayLocale::English), "Scheduled");
    }

    #[test]
    fn test_locale_tags() {
        assert_eq!(DisplayLocale::from_tag("id-ID"), Some(DisplayLocale::Indonesian));
        assert_eq!(DisplayLocale::from_tag("en_US"), Some(DisplayLocale::English));
        assert_eq!(DisplayLocale::from_tag("fr"), None);
    }

    proptest! {
        #[test]
        fn prop_unknown_status_is_pending(s in "\\PC*") {
            prop_assume!(BackendStatus::parse(&s).is_none());
            prop_assert_eq!(map_status(&s), DisplayStatus::Pending);
        }
    }
}
