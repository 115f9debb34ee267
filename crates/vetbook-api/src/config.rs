//! Clinic API client configuration.

use url::Url;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of retries after a transport failure.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Configuration for connecting to the clinic API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL including the API prefix, e.g. `https://clinic.example/v1/api`.
    pub base_url: Url,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after a connect error or timeout. HTTP error statuses are
    /// never retried.
    pub max_retries: u32,
}

impl ApiConfig {
    /// Build a configuration from an explicit base URL string.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ConfigError::InvalidUrl(base_url.to_string(), e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl(
                base_url.to_string(),
                "URL cannot be used as a base".into(),
            ));
        }
        Ok(Self {
            base_url,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `VETBOOK_API_URL` (required)
    /// - `VETBOOK_TIMEOUT_SECS` (default: 30)
    /// - `VETBOOK_MAX_RETRIES` (default: 3)
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = std::env::var("VETBOOK_API_URL").map_err(|_| ConfigError::MissingBaseUrl)?;
        Ok(Self::new(&raw)?.with_env_overrides())
    }

    /// Apply `VETBOOK_TIMEOUT_SECS` and `VETBOOK_MAX_RETRIES` on top of
    /// this configuration.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any variable source. Unparseable values are
    /// ignored.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(timeout) = lookup("VETBOOK_TIMEOUT_SECS").and_then(|s| s.trim().parse().ok()) {
            self.timeout_secs = timeout;
        }
        if let Some(retries) = lookup("VETBOOK_MAX_RETRIES").and_then(|s| s.trim().parse().ok()) {
            self.max_retries = retries;
        }
        self
    }

    /// Configuration pointing at a local mock server (for testing).
    pub fn local_mock(server_uri: &str) -> Result<Self, ConfigError> {
        let mut config = Self::new(&format!("{}/v1/api", server_uri.trim_end_matches('/')))?;
        config.timeout_secs = 5;
        Ok(config)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("VETBOOK_API_URL environment variable is required")]
    MissingBaseUrl,
    #[error("invalid URL {0}: {1}")]
    InvalidUrl(String, String),
}
