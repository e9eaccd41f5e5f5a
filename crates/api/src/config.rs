//! Cart API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CART_API_TOKENS` - Comma-separated `token=userId` pairs accepted as bearer tokens
//!
//! ## Optional
//! - `CART_API_HOST` - Bind address (default: 127.0.0.1)
//! - `CART_API_PORT` - Listen port (default: 3000)
//! - `CART_API_CATALOG` - Path to a JSON product catalog (default: built-in seed catalog)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use storefront_cart_core::UserId;
use thiserror::Error;

const MIN_TOKEN_LENGTH: usize = 16;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Substrings that mark a token copied from a sample `.env` (lowercase).
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "changeme",
    "example",
    "placeholder",
    "secret",
    "token",
    "xxx",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Cart API configuration.
///
/// Implements `Debug` manually to redact the token table.
#[derive(Clone)]
pub struct ApiConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Accepted bearer tokens and the user each one authenticates
    pub tokens: HashMap<String, UserId>,
    /// Optional product catalog file
    pub catalog_path: Option<PathBuf>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tokens", &format!("[REDACTED; {} tokens]", self.tokens.len()))
            .field("catalog_path", &self.catalog_path)
            .field("sentry_dsn", &self.sentry_dsn)
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if tokens fail validation (placeholder detection, length, entropy).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("CART_API_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("CART_API_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("CART_API_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("CART_API_PORT".to_string(), e.to_string()))?;
        let tokens = parse_tokens("CART_API_TOKENS", &get_required_env("CART_API_TOKENS")?)?;
        let catalog_path = get_optional_env("CART_API_CATALOG").map(PathBuf::from);
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            host,
            port,
            tokens,
            catalog_path,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
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

/// Parse `token=userId` pairs, validating each token.
fn parse_tokens(key: &str, value: &str) -> Result<HashMap<String, UserId>, ConfigError> {
    let mut tokens = HashMap::new();

    for pair in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (token, user) = pair.split_once('=').ok_or_else(|| {
            ConfigError::InvalidEnvVar(key.to_string(), "expected token=userId".to_string())
        })?;
        let user = user
            .trim()
            .parse::<UserId>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
        let token = token.trim();

        validate_token_strength(token, key)?;
        tokens.insert(token.to_string(), user);
    }

    if tokens.is_empty() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "no tokens configured".to_string(),
        ));
    }

    Ok(tokens)
}

/// Bits of entropy per character, from the token's own character frequencies.
fn shannon_entropy(token: &str) -> f64 {
    let mut counts: HashMap<char, u32> = HashMap::new();
    for c in token.chars() {
        *counts.entry(c).or_default() += 1;
    }

    let total: u32 = counts.values().sum();
    if total == 0 {
        return 0.0;
    }

    counts
        .values()
        .map(|&n| f64::from(n) / f64::from(total))
        .map(|p| -p * p.log2())
        .sum()
}

/// Reject tokens that are short, look like a placeholder, or are too
/// repetitive to have been randomly generated.
fn validate_token_strength(token: &str, var_name: &str) -> Result<(), ConfigError> {
    let insecure = |reason: String| Err(ConfigError::InsecureSecret(var_name.to_string(), reason));

    let length = token.chars().count();
    if length < MIN_TOKEN_LENGTH {
        return insecure(format!(
            "token has {length} characters, need at least {MIN_TOKEN_LENGTH}"
        ));
    }

    let lower = token.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return insecure(format!("token looks like a placeholder ('{pattern}')"));
    }

    let entropy = shannon_entropy(token);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return insecure(format!(
            "token is too repetitive ({entropy:.2} bits/char, need {MIN_ENTROPY_BITS_PER_CHAR:.1})"
        ));
    }

    Ok(())
}
