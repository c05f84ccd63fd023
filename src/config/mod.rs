//! Configuration management for the Coinglass MCP server.
//!
//! Loads settings from environment variables (after reading `.env`) and an
//! optional `coinglass.toml`, then validates them into an immutable
//! [`ClientConfig`].

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::coinglass::CoinglassError;

/// Production Coinglass v4 host.
pub const DEFAULT_BASE_URL: &str = "https://open-api-v4.coinglass.com";

/// Raw settings as read from the environment and config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// API host, e.g. `https://open-api-v4.coinglass.com`
    #[serde(default = "default_base_url")]
    pub api_base_url: String,
    /// Value sent in the `CG-API-KEY` header
    #[serde(default)]
    pub api_key: String,
    /// Minimum spacing between outbound requests, in milliseconds
    #[serde(default = "default_rate_limit_ms")]
    pub api_rate_limit: u64,
    /// Per-attempt request timeout, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub api_timeout_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_rate_limit_ms() -> u64 {
    250
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: default_base_url(),
            api_key: String::new(),
            api_rate_limit: default_rate_limit_ms(),
            api_timeout_ms: default_timeout_ms(),
        }
    }
}

impl Settings {
    /// Load settings from `.env`, `coinglass.toml` and `COINGLASS_*` variables.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("coinglass").required(false))
            .add_source(config::Environment::with_prefix("COINGLASS"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Load settings from an explicit variable map instead of the process environment.
    pub fn from_env_map(vars: HashMap<String, String>) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("COINGLASS").source(Some(vars)))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate into a client configuration.
    pub fn client_config(&self) -> Result<ClientConfig, CoinglassError> {
        ClientConfig::new(
            self.api_base_url.clone(),
            self.api_key.clone(),
            self.api_rate_limit,
            self.api_timeout_ms,
        )
    }
}

/// Validated, immutable client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    base_url: String,
    api_key: String,
    min_request_interval: Duration,
    request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        min_request_interval_ms: u64,
        request_timeout_ms: u64,
    ) -> Result<Self, CoinglassError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(CoinglassError::config(
                "COINGLASS_API_KEY is required. Set it in your environment to use Coinglass endpoints.",
            ));
        }

        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(CoinglassError::config("COINGLASS_API_BASE_URL must not be empty"));
        }

        if request_timeout_ms == 0 {
            return Err(CoinglassError::config("request timeout must be positive"));
        }

        Ok(Self {
            base_url,
            api_key,
            min_request_interval: Duration::from_millis(min_request_interval_ms),
            request_timeout: Duration::from_millis(request_timeout_ms),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn min_request_interval(&self) -> Duration {
        self.min_request_interval
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("min_request_interval", &self.min_request_interval)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_applied_from_env_map() {
        let settings = Settings::from_env_map(vars(&[("COINGLASS_API_KEY", "secret")])).unwrap();
        assert_eq!(settings.api_base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.api_key, "secret");
        assert_eq!(settings.api_rate_limit, 250);
        assert_eq!(settings.api_timeout_ms, 10_000);
    }

    #[test]
    fn test_env_overrides() {
        let settings = Settings::from_env_map(vars(&[
            ("COINGLASS_API_KEY", "secret"),
            ("COINGLASS_API_BASE_URL", "http://localhost:9000/"),
            ("COINGLASS_API_RATE_LIMIT", "1000"),
        ]))
        .unwrap();
        let config = settings.client_config().unwrap();
        assert_eq!(config.base_url(), "http://localhost:9000");
        assert_eq!(config.min_request_interval(), Duration::from_millis(1000));
    }

    #[test]
    fn test_numeric_looking_keys_kept_verbatim() {
        for key in ["00123456", "12345678901234567890123", "1e10"] {
            let settings = Settings::from_env_map(vars(&[
                ("COINGLASS_API_KEY", key),
                ("COINGLASS_API_TIMEOUT_MS", "2500"),
            ]))
            .unwrap();
            assert_eq!(settings.api_key, key);
            assert_eq!(settings.api_timeout_ms, 2_500);
            assert_eq!(settings.client_config().unwrap().api_key(), key);
        }
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let settings = Settings::from_env_map(HashMap::new()).unwrap();
        let err = settings.client_config().unwrap_err();
        assert!(matches!(err, CoinglassError::Config(_)));
        assert!(err.to_string().contains("COINGLASS_API_KEY"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = ClientConfig::new(DEFAULT_BASE_URL, "key", 250, 0).unwrap_err();
        assert!(matches!(err, CoinglassError::Config(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ClientConfig::new(DEFAULT_BASE_URL, "super-secret", 250, 10_000).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
    }
}
