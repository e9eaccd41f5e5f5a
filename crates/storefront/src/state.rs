//! Cart state owned by the application root.

use std::sync::Arc;

use secrecy::SecretString;

use crate::config::CartConfig;
use crate::gateway::{GatewayError, HttpCartGateway};
use crate::local::FileStorage;
use crate::reconciler::CartReconciler;

/// The production cart: guest cart on disk, account cart over HTTP.
pub type StorefrontCart = CartReconciler<FileStorage, HttpCartGateway>;

/// Cart state shared across the application.
///
/// This struct is cheaply cloneable via `Arc`. Build one per application
/// session and pass it to every consumer instead of keeping global caches.
#[derive(Clone)]
pub struct CartState {
    inner: Arc<CartStateInner>,
}

struct CartStateInner {
    config: CartConfig,
    cart: StorefrontCart,
}

impl CartState {
    /// Create the cart state.
    ///
    /// # Arguments
    ///
    /// * `config` - Cart client configuration
    /// * `token` - Bearer token of the current login, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: CartConfig, token: Option<SecretString>) -> Result<Self, GatewayError> {
        let gateway = HttpCartGateway::new(&config.api, token)?;
        let storage = FileStorage::new(&config.data_dir);
        let cart = CartReconciler::new(storage, gateway, config.cache_ttl);

        Ok(Self {
            inner: Arc::new(CartStateInner { config, cart }),
        })
    }

    /// Get a reference to the cart configuration.
    #[must_use]
    pub fn config(&self) -> &CartConfig {
        &self.inner.config
    }

    /// Get a reference to the cart.
    #[must_use]
    pub fn cart(&self) -> &StorefrontCart {
        &self.inner.cart
    }
}
