//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CLEMENTINE_API_BASE_URL` - Base URL of the Clementine backend
//!   (e.g. `https://shop.example.com`)
//!
//! ## Optional
//! - `CLEMENTINE_API_TIMEOUT_MS` - Client-side request timeout in
//!   milliseconds (default: 10000)
//! - `CLEMENTINE_STATE_DIR` - Directory for persisted client state (the
//!   cart session). When unset, state is kept in memory only.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const ENV_BASE_URL: &str = "CLEMENTINE_API_BASE_URL";
const ENV_TIMEOUT_MS: &str = "CLEMENTINE_API_TIMEOUT_MS";
const ENV_STATE_DIR: &str = "CLEMENTINE_STATE_DIR";

const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client SDK configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the Clementine backend.
    pub base_url: Url,
    /// Client-side timeout applied to every outbound request.
    pub timeout: Duration,
    /// Directory for persisted client state; `None` keeps state in memory.
    pub state_dir: Option<PathBuf>,
}

impl ClientConfig {
    /// Configuration with defaults for everything but the base URL.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            state_dir: None,
        }
    }

    /// Override the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Persist client state under `dir`.
    #[must_use]
    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = Some(dir.into());
        self
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or unparseable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_base_url = lookup(ENV_BASE_URL)
            .ok_or_else(|| ConfigError::MissingEnvVar(ENV_BASE_URL.to_string()))?;
        let base_url = Url::parse(&raw_base_url)
            .map_err(|err| ConfigError::InvalidEnvVar(ENV_BASE_URL.to_string(), err.to_string()))?;

        let timeout = match lookup(ENV_TIMEOUT_MS) {
            Some(raw) => {
                let millis: u64 = raw.parse().map_err(|_| {
                    ConfigError::InvalidEnvVar(
                        ENV_TIMEOUT_MS.to_string(),
                        format!("not a millisecond count: {raw}"),
                    )
                })?;
                Duration::from_millis(millis)
            }
            None => DEFAULT_TIMEOUT,
        };

        let state_dir = lookup(ENV_STATE_DIR).map(PathBuf::from);

        Ok(Self {
            base_url,
            timeout,
            state_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_minimal_environment() {
        let config = ClientConfig::from_lookup(lookup(&[(
            ENV_BASE_URL,
            "https://shop.example.com",
        )]))
        .expect("config");
        assert_eq!(config.base_url.as_str(), "https://shop.example.com/");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.state_dir, None);
    }

    #[test]
    fn test_missing_base_url_is_an_error() {
        let err = ClientConfig::from_lookup(lookup(&[])).expect_err("must fail");
        assert!(matches!(err, ConfigError::MissingEnvVar(name) if name == ENV_BASE_URL));
    }

    #[test]
    fn test_invalid_timeout_is_an_error() {
        let err = ClientConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "https://shop.example.com"),
            (ENV_TIMEOUT_MS, "soon"),
        ]))
        .expect_err("must fail");
        assert!(matches!(err, ConfigError::InvalidEnvVar(name, _) if name == ENV_TIMEOUT_MS));
    }

    #[test]
    fn test_full_environment() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "http://localhost:8080"),
            (ENV_TIMEOUT_MS, "2500"),
            (ENV_STATE_DIR, "/tmp/clementine"),
        ]))
        .expect("config");
        assert_eq!(config.timeout, Duration::from_millis(2500));
        assert_eq!(config.state_dir, Some(PathBuf::from("/tmp/clementine")));
    }
}
