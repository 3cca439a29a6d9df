//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `ROCKETSHOES_API_URL` - Stock and catalog API base URL (default: `http://localhost:3333`)
//! - `ROCKETSHOES_STORAGE_PATH` - Durable cart store file (default: `.rocketshoes/storage.json`)
//! - `ROCKETSHOES_CART_KEY` - Key the cart is stored under (default: `@RocketShoes:cart`)
//! - `ROCKETSHOES_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `ROCKETSHOES_CATALOG_CACHE_TTL_SECS` - Product metadata cache TTL (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::persistence::DEFAULT_CART_KEY;

const DEFAULT_API_URL: &str = "http://localhost:3333";
const DEFAULT_STORAGE_PATH: &str = ".rocketshoes/storage.json";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CATALOG_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Stock oracle and product catalog API
    pub api: ApiConfig,
    /// Durable cart store location
    pub storage: StorageConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
}

/// Stock and catalog API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL; `/stock/{id}` and `/products/{id}` are resolved against it
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// How long product metadata stays cached (stock is never cached)
    pub catalog_cache_ttl: Duration,
}

/// Durable cart store configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// File backing the key-value store
    pub path: PathBuf,
    /// Key the serialized cart lives under
    pub cart_key: String,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let base_url = parse_base_url(
            "ROCKETSHOES_API_URL",
            &get_or("ROCKETSHOES_API_URL", DEFAULT_API_URL),
        )?;
        let timeout = parse_secs(
            "ROCKETSHOES_HTTP_TIMEOUT_SECS",
            lookup("ROCKETSHOES_HTTP_TIMEOUT_SECS"),
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?;
        let catalog_cache_ttl = parse_secs(
            "ROCKETSHOES_CATALOG_CACHE_TTL_SECS",
            lookup("ROCKETSHOES_CATALOG_CACHE_TTL_SECS"),
            DEFAULT_CATALOG_CACHE_TTL_SECS,
        )?;

        let cart_key = get_or("ROCKETSHOES_CART_KEY", DEFAULT_CART_KEY);
        if cart_key.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "ROCKETSHOES_CART_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        Ok(Self {
            api: ApiConfig {
                base_url,
                timeout,
                catalog_cache_ttl,
            },
            storage: StorageConfig {
                path: PathBuf::from(get_or("ROCKETSHOES_STORAGE_PATH", DEFAULT_STORAGE_PATH)),
                cart_key,
            },
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }
}

impl ApiConfig {
    /// API configuration with default timeout and cache TTL.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            catalog_cache_ttl: Duration::from_secs(DEFAULT_CATALOG_CACHE_TTL_SECS),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an HTTP(S) base URL.
fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url =
        Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be usable as a base URL".to_string(),
        ));
    }

    Ok(url)
}

/// Parse a whole number of seconds, falling back to `default` when unset.
fn parse_secs(key: &str, value: Option<String>, default: u64) -> Result<Duration, ConfigError> {
    let Some(value) = value else {
        return Ok(Duration::from_secs(default));
    };

    let secs = value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }

    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.api.base_url.as_str(), "http://localhost:3333/");
        assert_eq!(config.api.timeout, Duration::from_secs(10));
        assert_eq!(config.api.catalog_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.storage.path, PathBuf::from(".rocketshoes/storage.json"));
        assert_eq!(config.storage.cart_key, "@RocketShoes:cart");
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = StorefrontConfig::from_lookup(lookup_from(&[
            ("ROCKETSHOES_API_URL", "https://api.example.com/v1/"),
            ("ROCKETSHOES_STORAGE_PATH", "/tmp/cart.json"),
            ("ROCKETSHOES_CART_KEY", "@Test:cart"),
            ("ROCKETSHOES_HTTP_TIMEOUT_SECS", "3"),
            ("ROCKETSHOES_CATALOG_CACHE_TTL_SECS", "60"),
            ("SENTRY_DSN", "https://key@sentry.example.com/1"),
        ]))
        .unwrap();

        assert_eq!(config.api.base_url.as_str(), "https://api.example.com/v1/");
        assert_eq!(config.api.timeout, Duration::from_secs(3));
        assert_eq!(config.api.catalog_cache_ttl, Duration::from_secs(60));
        assert_eq!(config.storage.cart_key, "@Test:cart");
        assert!(config.sentry_dsn.is_some());
    }

    #[test]
    fn test_empty_sentry_dsn_is_disabled() {
        let config = StorefrontConfig::from_lookup(lookup_from(&[("SENTRY_DSN", "")])).unwrap();
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_invalid_api_url() {
        let err =
            StorefrontConfig::from_lookup(lookup_from(&[("ROCKETSHOES_API_URL", "not a url")]))
                .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnvVar(ref key, _) if key == "ROCKETSHOES_API_URL"
        ));

        let err = StorefrontConfig::from_lookup(lookup_from(&[(
            "ROCKETSHOES_API_URL",
            "ftp://files.example.com",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_invalid_timeout() {
        for value in ["0", "-1", "ten"] {
            let result = StorefrontConfig::from_lookup(lookup_from(&[(
                "ROCKETSHOES_HTTP_TIMEOUT_SECS",
                value,
            )]));
            assert!(result.is_err(), "timeout {value:?} should be rejected");
        }
    }

    #[test]
    fn test_blank_cart_key_rejected() {
        let result = StorefrontConfig::from_lookup(lookup_from(&[("ROCKETSHOES_CART_KEY", "  ")]));
        assert!(result.is_err());
    }
}
