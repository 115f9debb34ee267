//! Client-side configuration.

use crate::models::DisplayLocale;

/// Shown wherever a field could not be resolved from any source.
pub const DEFAULT_PLACEHOLDER: &str = "Unknown";

/// Settings for normalization and controller behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreConfig {
    /// Locale for day/month names and status labels.
    pub locale: DisplayLocale,
    /// Offset from UTC (minutes) in which dates and times are displayed.
    pub utc_offset_minutes: i32,
    /// Text for unresolved fields.
    pub placeholder: String,
    /// Push local status overrides to the backend update endpoint.
    pub status_sync_enabled: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            locale: DisplayLocale::English,
            utc_offset_minutes: 0,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            status_sync_enabled: false,
        }
    }
}

impl CoreConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    ///
    /// Variables:
    /// - `VETBOOK_LOCALE` (`en` or `id`, default: `en`)
    /// - `VETBOOK_UTC_OFFSET_MINUTES` (default: 0)
    /// - `VETBOOK_PLACEHOLDER` (default: `Unknown`)
    /// - `VETBOOK_STATUS_SYNC` (`1`/`true` to enable, default: off)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            locale: std::env::var("VETBOOK_LOCALE")
                .ok()
                .and_then(|tag| DisplayLocale::from_tag(&tag))
                .unwrap_or(defaults.locale),
            utc_offset_minutes: std::env::var("VETBOOK_UTC_OFFSET_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|m: &i32| m.abs() < 24 * 60)
                .unwrap_or(defaults.utc_offset_minutes),
            placeholder: std::env::var("VETBOOK_PLACEHOLDER")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.placeholder),
            status_sync_enabled: std::env::var("VETBOOK_STATUS_SYNC")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.status_sync_enabled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoreConfig::default();
        assert_eq!(config.placeholder, "Unknown");
        assert!(!config.status_sync_enabled);
        assert_eq!(config.utc_offset_minutes, 0);
    }
}
