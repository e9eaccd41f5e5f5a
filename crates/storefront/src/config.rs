//! Cart client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CART_API_BASE_URL` - Base URL of the cart API (e.g., `http://127.0.0.1:3000/`)
//!
//! ## Optional
//! - `CART_API_TIMEOUT_SECS` - HTTP request timeout (default: 10)
//! - `CART_CACHE_TTL_SECS` - How long a fetched remote cart is reused (default: 60)
//! - `CART_DATA_DIR` - Directory for the guest cart and session files (default: `.storefront-cart`)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: &str = "10";
const DEFAULT_CACHE_TTL_SECS: &str = "60";
const DEFAULT_DATA_DIR: &str = ".storefront-cart";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart client configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Remote cart API configuration
    pub api: CartApiConfig,
    /// Time-to-live for the in-memory remote cart view
    pub cache_ttl: Duration,
    /// Directory holding the guest cart and session files
    pub data_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Remote cart API configuration.
#[derive(Debug, Clone)]
pub struct CartApiConfig {
    /// Base URL, always ending in `/` so relative paths join beneath it
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api = CartApiConfig::from_env()?;
        let cache_ttl = parse_secs(
            "CART_CACHE_TTL_SECS",
            &get_env_or_default("CART_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS),
        )?;
        let data_dir = PathBuf::from(get_env_or_default("CART_DATA_DIR", DEFAULT_DATA_DIR));
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            api,
            cache_ttl,
            data_dir,
            sentry_dsn,
        })
    }
}

impl CartApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(
                "CART_API_BASE_URL",
                &get_required_env("CART_API_BASE_URL")?,
            )?,
            timeout: parse_secs(
                "CART_API_TIMEOUT_SECS",
                &get_env_or_default("CART_API_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
            )?,
        })
    }

    /// Build a configuration for a known base URL with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` is not a valid HTTP(S) URL.
    pub fn for_base_url(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("CART_API_BASE_URL", base_url)?,
            timeout: Duration::from_secs(10),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a whole number of seconds.
fn parse_secs(key: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse an HTTP(S) base URL and make sure it ends with a slash.
fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_appends_slash() {
        let url = parse_base_url("TEST_VAR", "http://localhost:3000/shop").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/shop/");
        assert_eq!(
            url.join("api/cart").unwrap().as_str(),
            "http://localhost:3000/shop/api/cart"
        );
    }

    #[test]
    fn test_parse_base_url_keeps_root() {
        let url = parse_base_url("TEST_VAR", "https://cart.example.com").unwrap();
        assert_eq!(url.as_str(), "https://cart.example.com/");
    }

    #[test]
    fn test_parse_base_url_rejects_other_schemes() {
        let err = parse_base_url("TEST_VAR", "ftp://example.com").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));

        let err = parse_base_url("TEST_VAR", "not a url").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_parse_secs() {
        assert_eq!(
            parse_secs("TEST_VAR", "30").unwrap(),
            Duration::from_secs(30)
        );
        assert!(parse_secs("TEST_VAR", "-1").is_err());
        assert!(parse_secs("TEST_VAR", "ten").is_err());
    }
}
