//! Client configuration.
//!
//! Defaults match a local ingestion backend: `http://localhost:5000`, no
//! timeout beyond what the transport imposes, no retries.

use std::num::NonZeroU32;
use std::time::Duration;

use crate::error::ConfigError;
use crate::retry::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

pub const BASE_URL_VAR: &str = "TRANSIT_API_BASE_URL";
pub const TIMEOUT_SECS_VAR: &str = "TRANSIT_API_TIMEOUT_SECS";
pub const MAX_ATTEMPTS_VAR: &str = "TRANSIT_API_MAX_ATTEMPTS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Option<Duration>,
    pub retry: Option<RetryPolicy>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            retry: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a config from any variable source; unset variables keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base_url) = lookup(BASE_URL_VAR) {
            config.base_url = base_url;
        }
        if let Some(raw) = lookup(TIMEOUT_SECS_VAR) {
            let secs = parse_number::<u64>(TIMEOUT_SECS_VAR, "a whole number of seconds", &raw)?;
            config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(raw) = lookup(MAX_ATTEMPTS_VAR) {
            let attempts =
                parse_number::<NonZeroU32>(MAX_ATTEMPTS_VAR, "a positive integer", &raw)?.get();
            config.retry = (attempts > 1).then(|| RetryPolicy::with_max_attempts(attempts));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.starts_with("http://") || self.base_url.starts_with("https://") {
            Ok(())
        } else {
            Err(ConfigError::InvalidBaseUrl(self.base_url.clone()))
        }
    }
}

fn parse_number<N: std::str::FromStr>(
    var: &'static str,
    expected: &'static str,
    raw: &str,
) -> Result<N, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        expected,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.base_url, "http://localhost:5000");
    }

    #[test]
    fn reads_all_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            (BASE_URL_VAR, "https://transit.example.org/api"),
            (TIMEOUT_SECS_VAR, "10"),
            (MAX_ATTEMPTS_VAR, "4"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://transit.example.org/api");
        assert_eq!(config.timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.retry.map(|r| r.max_attempts), Some(4));
    }

    #[test]
    fn zero_timeout_and_single_attempt_disable_both() {
        let config = ClientConfig::from_lookup(lookup(&[
            (TIMEOUT_SECS_VAR, "0"),
            (MAX_ATTEMPTS_VAR, "1"),
        ]))
        .unwrap();
        assert!(config.timeout.is_none());
        assert!(config.retry.is_none());
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        let err = ClientConfig::from_lookup(lookup(&[(TIMEOUT_SECS_VAR, "soon")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                var: TIMEOUT_SECS_VAR,
                ..
            }
        ));
    }

    #[test]
    fn rejects_zero_max_attempts() {
        let err = ClientConfig::from_lookup(lookup(&[(MAX_ATTEMPTS_VAR, "0")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                var: MAX_ATTEMPTS_VAR,
                expected: "a positive integer",
                ..
            }
        ));
        assert!(ClientConfig::from_lookup(lookup(&[(MAX_ATTEMPTS_VAR, "-2")])).is_err());
    }

    #[test]
    fn rejects_base_url_without_scheme() {
        let err =
            ClientConfig::from_lookup(lookup(&[(BASE_URL_VAR, "localhost:5000")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl(_)));
    }
}
