//! Application state shared across handlers.

use std::sync::Arc;

use storefront_cart_core::UserId;

use crate::catalog::Catalog;
use crate::config::ApiConfig;
use crate::store::CartRepository;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct ApiState {
    inner: Arc<ApiStateInner>,
}

struct ApiStateInner {
    config: ApiConfig,
    catalog: Catalog,
    carts: CartRepository,
}

impl ApiState {
    /// Create a new application state with empty carts.
    #[must_use]
    pub fn new(config: ApiConfig, catalog: Catalog) -> Self {
        Self {
            inner: Arc::new(ApiStateInner {
                config,
                catalog,
                carts: CartRepository::new(),
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn carts(&self) -> &CartRepository {
        &self.inner.carts
    }

    /// The user a bearer token authenticates, if any.
    #[must_use]
    pub fn user_for_token(&self, token: &str) -> Option<UserId> {
        self.inner.config.tokens.get(token).copied()
    }
}
