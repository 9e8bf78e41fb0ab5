//! Console Configuration
//!
//! Defaults match the signal repository's development setup. Every value can
//! be overridden from the environment (a `.env` file is honoured).

use std::env;
use std::time::Duration;

use crate::error::ConfigError;

/// Refresh cadence used when nothing else is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

const BASE_URL_VAR: &str = "HEALFLOW_BASE_URL";
const POLL_INTERVAL_VAR: &str = "HEALFLOW_POLL_INTERVAL_MS";
const REQUEST_TIMEOUT_VAR: &str = "HEALFLOW_REQUEST_TIMEOUT_MS";
const DEMO_VAR: &str = "HEALFLOW_DEMO";

#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Base address of the signal repository, without the `/api` suffix.
    pub base_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    /// Serve signals from the seeded in-memory repository instead of HTTP.
    pub demo: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            demo: false,
        }
    }
}

impl SyncConfig {
    /// Load `.env` (if any) and apply environment overrides on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`SyncConfig::from_env`] but reading from an arbitrary source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup(BASE_URL_VAR) {
            let url = url.trim().trim_end_matches('/');
            if url.is_empty() {
                return Err(ConfigError::Empty { key: BASE_URL_VAR });
            }
            config.base_url = url.to_string();
        }
        if let Some(raw) = lookup(POLL_INTERVAL_VAR) {
            config.poll_interval = parse_millis(POLL_INTERVAL_VAR, &raw)?;
        }
        if let Some(raw) = lookup(REQUEST_TIMEOUT_VAR) {
            config.request_timeout = parse_millis(REQUEST_TIMEOUT_VAR, &raw)?;
        }
        if let Some(raw) = lookup(DEMO_VAR) {
            let raw = raw.trim().to_ascii_lowercase();
            config.demo = matches!(raw.as_str(), "1" | "true" | "yes" | "on");
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

fn parse_millis(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConfigError::InvalidNumber {
            key,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SyncConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, SyncConfig::default());
        assert_eq!(config.poll_interval, Duration::from_secs(3));
    }

    #[test]
    fn test_overrides() {
        let config = SyncConfig::from_lookup(lookup(&[
            ("HEALFLOW_BASE_URL", "http://radar.internal:9000/"),
            ("HEALFLOW_POLL_INTERVAL_MS", "500"),
            ("HEALFLOW_DEMO", "true"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://radar.internal:9000");
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert!(config.demo);
    }

    #[test]
    fn test_invalid_interval() {
        let err =
            SyncConfig::from_lookup(lookup(&[("HEALFLOW_POLL_INTERVAL_MS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { key: "HEALFLOW_POLL_INTERVAL_MS", .. }));

        let err = SyncConfig::from_lookup(lookup(&[("HEALFLOW_BASE_URL", " ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Empty { .. }));
    }
}
