//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `STOREFRONT_API_URL` - Backend base URL (default: `http://127.0.0.1:5000/api`)
//! - `STOREFRONT_STATE_DIR` - Directory of the file store (default: `.storefront`)
//! - `STOREFRONT_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 15)
//! - `STOREFRONT_CATALOG_CACHE_TTL_SECS` - Catalog cache TTL, 0 disables (default: 300)
//! - `STOREFRONT_NOTIFICATION_CAPACITY` - Notifications buffered per observer (default: 64)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::api::ApiConfig;
use crate::notify::DEFAULT_CAPACITY;

const DEFAULT_API_URL: &str = "http://127.0.0.1:5000/api";
const DEFAULT_STATE_DIR: &str = ".storefront";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend connection settings
    pub api: ApiConfig,
    /// Directory holding the persisted cart and token
    pub state_dir: PathBuf,
    /// Notifications buffered per observer
    pub notification_capacity: usize,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a variable is set to a value
    /// that cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let base_url = Url::parse(&get("STOREFRONT_API_URL", DEFAULT_API_URL)).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_API_URL".to_string(), e.to_string())
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_API_URL".to_string(),
                format!("unsupported scheme '{}'", base_url.scheme()),
            ));
        }

        let timeout_secs: u64 = parse_var(
            "STOREFRONT_HTTP_TIMEOUT_SECS",
            &get("STOREFRONT_HTTP_TIMEOUT_SECS", "15"),
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_HTTP_TIMEOUT_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let cache_ttl_secs: u64 = parse_var(
            "STOREFRONT_CATALOG_CACHE_TTL_SECS",
            &get("STOREFRONT_CATALOG_CACHE_TTL_SECS", "300"),
        )?;
        let notification_capacity: usize = parse_var(
            "STOREFRONT_NOTIFICATION_CAPACITY",
            &get(
                "STOREFRONT_NOTIFICATION_CAPACITY",
                &DEFAULT_CAPACITY.to_string(),
            ),
        )?;
        if notification_capacity == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_NOTIFICATION_CAPACITY".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            api: ApiConfig {
                base_url,
                timeout: Duration::from_secs(timeout_secs),
                catalog_cache_ttl: Duration::from_secs(cache_ttl_secs),
            },
            state_dir: PathBuf::from(get("STOREFRONT_STATE_DIR", DEFAULT_STATE_DIR)),
            notification_capacity,
        })
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
