//! HTTP route handlers for the cart API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                        - Health check
//!
//! # Cart (requires bearer token)
//! GET    /api/cart                      - Current cart
//! DELETE /api/cart                      - Clear cart (204)
//! POST   /api/cart/items                - Add item, summing into an existing line
//! PATCH  /api/cart/items/{product_id}   - Set line quantity
//! DELETE /api/cart/items/{product_id}   - Remove line (204)
//! POST   /api/cart/merge                - Merge a guest cart, all-or-nothing
//!
//! # Products (public)
//! GET    /api/products/{product_id}     - Product record
//! ```

pub mod cart;
pub mod products;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::ApiState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<ApiState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{product_id}",
            patch(cart::update_item).delete(cart::remove_item),
        )
        .route("/merge", post(cart::merge))
}

/// Create the product routes router.
pub fn product_routes() -> Router<ApiState> {
    Router::new().route("/{product_id}", get(products::show))
}

/// Create all API routes.
pub fn routes() -> Router<ApiState> {
    Router::new()
        .nest("/api/cart", cart_routes())
        .nest("/api/products", product_routes())
}
