//! Command implementations.

pub mod cart;
pub mod session;

use storefront_cart::CartError;
use storefront_cart::config::ConfigError;
use storefront_cart::gateway::GatewayError;
use storefront_cart::local::StorageError;
use thiserror::Error;

/// Errors that end a CLI invocation.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error("Cart API client error: {0}")]
    Gateway(#[from] GatewayError),

    /// A cart operation failed.
    #[error("{}", .0.user_message())]
    Cart(#[from] CartError),

    /// The session record could not be read or written.
    #[error("Session storage error: {0}")]
    Storage(#[from] StorageError),
}
