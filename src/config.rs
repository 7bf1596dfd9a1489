// Application configuration
// Defaults can be overridden through environment variables. Unset variables use the
// default, invalid ones are reported and also fall back to the default.

use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

use crate::fetcher::SimulatedLatency;

pub const DEFAULT_API_HOST: &str = "sky-scrapper.p.rapidapi.com";
pub const DEFAULT_API_KEY: &str = "demo-key";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_key: String,
    pub api_host: String,
    // Serve built-in data instead of calling the live API
    pub demo_mode: bool,
    pub storage_dir: PathBuf,
    pub request_timeout_ms: u64,
    pub search_timeout_ms: u64,
    pub airport_debounce_ms: u64,
    pub min_airport_query_len: usize,
    pub latency: SimulatedLatency,
    pub virtualization_threshold: usize,
    pub default_page_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: DEFAULT_API_KEY.to_string(),
            api_host: DEFAULT_API_HOST.to_string(),
            demo_mode: true,
            storage_dir: PathBuf::from(".travel-search"),
            request_timeout_ms: 10000,
            search_timeout_ms: 30000,
            airport_debounce_ms: 1500,
            min_airport_query_len: 2,
            latency: SimulatedLatency::default(),
            virtualization_threshold: 50,
            default_page_size: 25,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    // Build from any key lookup; `from_env` passes the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            api_key: try_load(&lookup, "RAPIDAPI_KEY", defaults.api_key),
            api_host: try_load(&lookup, "RAPIDAPI_HOST", defaults.api_host),
            demo_mode: try_load(&lookup, "TRAVEL_SEARCH_DEMO", defaults.demo_mode),
            storage_dir: PathBuf::from(try_load(
                &lookup,
                "TRAVEL_SEARCH_STORAGE_DIR",
                defaults.storage_dir.display().to_string(),
            )),
            request_timeout_ms: try_load(
                &lookup,
                "TRAVEL_SEARCH_REQUEST_TIMEOUT_MS",
                defaults.request_timeout_ms,
            ),
            search_timeout_ms: try_load(
                &lookup,
                "TRAVEL_SEARCH_SEARCH_TIMEOUT_MS",
                defaults.search_timeout_ms,
            ),
            airport_debounce_ms: try_load(
                &lookup,
                "TRAVEL_SEARCH_AIRPORT_DEBOUNCE_MS",
                defaults.airport_debounce_ms,
            ),
            ..defaults
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_host.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "RAPIDAPI_HOST",
                reason: "host must not be empty".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "TRAVEL_SEARCH_REQUEST_TIMEOUT_MS",
                reason: "timeout must be positive".to_string(),
            });
        }
        if self.search_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "TRAVEL_SEARCH_SEARCH_TIMEOUT_MS",
                reason: "timeout must be positive".to_string(),
            });
        }
        Ok(())
    }

    pub fn base_url(&self) -> String {
        format!("https://{}/api/v1", self.api_host)
    }
}

fn try_load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        info!("{key} not set, using default: {default}");
        return default;
    };

    raw.trim().parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.base_url(), "https://sky-scrapper.p.rapidapi.com/api/v1");
        assert_eq!(config.latency.flights_ms, 2000);
    }

    #[test]
    fn test_overrides_and_invalid_values() {
        let config = AppConfig::from_lookup(lookup(&[
            ("RAPIDAPI_KEY", "abc"),
            ("TRAVEL_SEARCH_DEMO", "false"),
            ("TRAVEL_SEARCH_REQUEST_TIMEOUT_MS", "not-a-number"),
            ("TRAVEL_SEARCH_AIRPORT_DEBOUNCE_MS", " 300 "),
            ("TRAVEL_SEARCH_STORAGE_DIR", "/tmp/prefs"),
        ]))
        .unwrap();

        assert_eq!(config.api_key, "abc");
        assert!(!config.demo_mode);
        // Invalid value keeps the default
        assert_eq!(config.request_timeout_ms, 10000);
        assert_eq!(config.airport_debounce_ms, 300);
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/prefs"));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let result = AppConfig::from_lookup(lookup(&[("TRAVEL_SEARCH_SEARCH_TIMEOUT_MS", "0")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                key: "TRAVEL_SEARCH_SEARCH_TIMEOUT_MS",
                ..
            })
        ));
    }
}
