//! Remote cart API gateway.
//!
//! Once a user is authenticated the remote cart API is the source of truth.
//! The gateway is a thin translation layer: each mutation is one independent
//! request, nothing is batched, and a failed request never rolls back
//! requests that already succeeded.
//!
//! # Endpoints
//!
//! ```text
//! GET    /api/cart                     - Current cart
//! POST   /api/cart/items               - Add item
//! PATCH  /api/cart/items/{productId}   - Set quantity
//! DELETE /api/cart/items/{productId}   - Remove item
//! DELETE /api/cart                     - Clear cart
//! POST   /api/cart/merge               - Merge guest cart
//! GET    /api/products/{productId}     - Product record
//! ```

mod cache;
mod http;

use std::future::Future;

use storefront_cart_core::{Cart, CartItem, ProductId, ProductSnapshot, Quantity};
use thiserror::Error;

pub use cache::RemoteCartCache;
pub use http::HttpCartGateway;

/// Errors that can occur when talking to the cart API.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The API answered with an unexpected status.
    #[error("Cart API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The session token was missing or rejected.
    #[error("Not authorized by the cart API")]
    Unauthorized,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Operations the reconciler needs from the remote cart API.
pub trait CartGateway: Send + Sync {
    /// Fetch the authenticated user's cart.
    fn fetch_cart(&self) -> impl Future<Output = Result<Cart, GatewayError>> + Send;

    /// Add units of a product; returns the created or updated line.
    fn add_item(
        &self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> impl Future<Output = Result<CartItem, GatewayError>> + Send;

    /// Set the quantity of a product's line.
    fn update_item(
        &self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> impl Future<Output = Result<CartItem, GatewayError>> + Send;

    /// Remove a product's line.
    fn remove_item(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Remove every line.
    fn clear(&self) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Submit the whole guest cart in one request.
    ///
    /// The API applies the merge all-or-nothing; only success or failure
    /// matters to the caller.
    fn merge(&self, items: &[CartItem]) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Fetch a product record, used to snapshot products into the guest cart.
    fn fetch_product(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<ProductSnapshot, GatewayError>> + Send;
}
