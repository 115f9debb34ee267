//! Locale-aware date/time formatting for reservations.

use chrono::{DateTime, FixedOffset, Locale, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};

use crate::models::DisplayLocale;

const DATE_FORMAT: &str = "%A, %-d %B %Y";
const TIME_FORMAT: &str = "%H.%M";

/// ISO 8601 layouts with an explicit offset that RFC 3339 rejects
/// (minute precision, `+0700`).
const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%dT%H:%M%:z",
];

/// Naive layouts accepted in addition to RFC 3339. Interpreted as wall time
/// in the display offset.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A successfully parsed source timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedInstant {
    pub instant: DateTime<Utc>,
    /// False for bare `YYYY-MM-DD` sources.
    pub has_time: bool,
}

/// Formatted pair for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedDateTime {
    pub date: String,
    /// `None` when the source carried no time of day.
    pub time: Option<String>,
    pub instant: DateTime<Utc>,
}

/// Shared formatter: one locale, one display offset.
#[derive(Debug, Clone)]
pub struct DateFormatter {
    locale: DisplayLocale,
    offset: FixedOffset,
}

impl DateFormatter {
    /// Out-of-range offsets fall back to UTC.
    pub fn new(locale: DisplayLocale, utc_offset_minutes: i32) -> Self {
        let offset = utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| {
                tracing::warn!(utc_offset_minutes, "invalid display offset, using UTC");
                Self::utc()
            });
        Self { locale, offset }
    }

    fn utc() -> FixedOffset {
        Utc.fix()
    }

    fn chrono_locale(&self) -> Locale {
        match self.locale {
            DisplayLocale::English => Locale::en_US,
            DisplayLocale::Indonesian => Locale::id_ID,
        }
    }

    /// Parse a source timestamp, or `None` if it is not one.
    pub fn parse(&self, raw: &str) -> Option<ParsedInstant> {
        let raw = raw.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(ParsedInstant {
                instant: dt.with_timezone(&Utc),
                has_time: true,
            });
        }

        let zoned = match raw.strip_suffix('Z') {
            Some(rest) => format!("{rest}+00:00"),
            None => raw.to_string(),
        };
        for format in OFFSET_DATETIME_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(&zoned, format) {
                return Some(ParsedInstant {
                    instant: dt.with_timezone(&Utc),
                    has_time: true,
                });
            }
        }

        for format in NAIVE_DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return self.from_wall_time(naive, true);
            }
        }

        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .and_then(|naive| self.from_wall_time(naive, false))
    }

    fn from_wall_time(&self, naive: NaiveDateTime, has_time: bool) -> Option<ParsedInstant> {
        self.offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| ParsedInstant {
                instant: dt.with_timezone(&Utc),
                has_time,
            })
    }

    /// Format a source timestamp, or `None` if it cannot be parsed.
    pub fn format(&self, raw: &str) -> Option<FormattedDateTime> {
        let parsed = self.parse(raw)?;
        let local = parsed.instant.with_timezone(&self.offset);
        let locale = self.chrono_locale();

        Some(FormattedDateTime {
            date: local.format_localized(DATE_FORMAT, locale).to_string(),
            time: parsed
                .has_time
                .then(|| local.format_localized(TIME_FORMAT, locale).to_string()),
            instant: parsed.instant,
        })
    }

    /// Date-only rendering; unparseable input passes through unchanged.
    pub fn format_date(&self, raw: &str) -> String {
        self.format(raw)
            .map(|f| f.date)
            .unwrap_or_else(|| raw.to_string())
    }
}
