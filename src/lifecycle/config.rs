//! Session configuration loaded from environment variables.

use std::env;
use std::time::Duration;

const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_CACHE_BUFFER: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the REST backend.
    pub api_base_url: String,
    /// Loaded data older than this is reloaded. `None` keeps it until marked stale.
    pub cache_max_age: Option<Duration>,
    /// Capacity of the resource cache's request channel.
    pub cache_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            cache_max_age: None,
            cache_buffer: DEFAULT_CACHE_BUFFER,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base_url =
            lookup("API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        if api_base_url.trim().is_empty() {
            return Err(ConfigError::EmptyApiBaseUrl);
        }

        let cache_max_age = lookup("CACHE_MAX_AGE_SECS")
            .map(|raw| {
                raw.parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|_| ConfigError::InvalidNumber("CACHE_MAX_AGE_SECS", raw))
            })
            .transpose()?;

        let cache_buffer = match lookup("CACHE_BUFFER") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::InvalidNumber("CACHE_BUFFER", raw)),
            },
            None => DEFAULT_CACHE_BUFFER,
        };

        Ok(Self {
            api_base_url,
            cache_max_age,
            cache_buffer,
        })
    }

    /// `cache_max_age` in the form the staleness policy uses.
    pub fn max_age(&self) -> Result<Option<chrono::Duration>, ConfigError> {
        self.cache_max_age
            .map(|age| {
                chrono::Duration::from_std(age)
                    .map_err(|_| ConfigError::InvalidNumber("CACHE_MAX_AGE_SECS", age.as_secs().to_string()))
            })
            .transpose()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("API_BASE_URL must not be empty")]
    EmptyApiBaseUrl,

    #[error("Invalid {0} value: {1:?}")]
    InvalidNumber(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        assert_eq!(Config::from_lookup(lookup(&[])).unwrap(), Config::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = Config::from_lookup(lookup(&[
            ("API_BASE_URL", "https://app.example.org"),
            ("CACHE_MAX_AGE_SECS", "300"),
            ("CACHE_BUFFER", "64"),
        ]))
        .unwrap();
        assert_eq!(config.api_base_url, "https://app.example.org");
        assert_eq!(config.cache_max_age, Some(Duration::from_secs(300)));
        assert_eq!(config.max_age().unwrap(), Some(chrono::Duration::seconds(300)));
        assert_eq!(config.cache_buffer, 64);
    }

    #[test]
    fn rejects_bad_numbers() {
        let err = Config::from_lookup(lookup(&[("CACHE_MAX_AGE_SECS", "soon")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidNumber("CACHE_MAX_AGE_SECS", "soon".into()));

        let err = Config::from_lookup(lookup(&[("CACHE_BUFFER", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber("CACHE_BUFFER", _)));

        let err = Config::from_lookup(lookup(&[("API_BASE_URL", " ")])).unwrap_err();
        assert_eq!(err, ConfigError::EmptyApiBaseUrl);
    }
}
