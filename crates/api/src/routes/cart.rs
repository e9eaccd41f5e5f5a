//! Cart route handlers.
//!
//! Every handler requires a bearer token and operates on that user's cart.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use storefront_cart_core::{
    AddCartItemRequest, Cart, CartItem, MergeCartRequest, ProductId, ProductSnapshot, Quantity,
    UpdateCartItemRequest,
};
use tracing::instrument;

use crate::error::{ApiError, Result};
use crate::middleware::RequireAuth;
use crate::state::ApiState;

/// `GET /api/cart`
#[instrument(skip(state))]
pub async fn show(State(state): State<ApiState>, RequireAuth(user): RequireAuth) -> Json<Cart> {
    Json(state.carts().get(user).await)
}

/// `POST /api/cart/items`
#[instrument(skip(state, payload))]
pub async fn add_item(
    State(state): State<ApiState>,
    RequireAuth(user): RequireAuth,
    payload: std::result::Result<Json<AddCartItemRequest>, JsonRejection>,
) -> Result<Json<CartItem>> {
    let Json(request) = payload?;
    let product = product(&state, request.product_id)?;

    let item = state.carts().add(user, product, request.quantity).await;
    tracing::debug!(product_id = %request.product_id, quantity = %item.quantity, "Added cart item");
    Ok(Json(item))
}

/// `PATCH /api/cart/items/{product_id}`
#[instrument(skip(state, payload))]
pub async fn update_item(
    State(state): State<ApiState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
    payload: std::result::Result<Json<UpdateCartItemRequest>, JsonRejection>,
) -> Result<Json<CartItem>> {
    let Json(request) = payload?;

    state
        .carts()
        .update(user, product_id, request.quantity)
        .await
        .map(Json)
        .ok_or_else(|| missing_line(product_id))
}

/// `DELETE /api/cart/items/{product_id}`
#[instrument(skip(state))]
pub async fn remove_item(
    State(state): State<ApiState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    if state.carts().remove(user, product_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(missing_line(product_id))
    }
}

/// `DELETE /api/cart`
#[instrument(skip(state))]
pub async fn clear(State(state): State<ApiState>, RequireAuth(user): RequireAuth) -> StatusCode {
    state.carts().clear(user).await;
    StatusCode::NO_CONTENT
}

/// `POST /api/cart/merge`
///
/// Every line is checked against the catalog before anything is applied, so
/// a request naming an unknown product leaves the cart untouched. Product
/// data comes from the catalog, not from the submitted snapshots.
#[instrument(skip(state, payload))]
pub async fn merge(
    State(state): State<ApiState>,
    RequireAuth(user): RequireAuth,
    payload: std::result::Result<Json<MergeCartRequest>, JsonRejection>,
) -> Result<Json<Cart>> {
    let Json(request) = payload?;

    let lines = request
        .items
        .iter()
        .map(|item| product(&state, item.product_id).map(|p| (p, item.quantity)))
        .collect::<Result<Vec<(ProductSnapshot, Quantity)>>>()?;

    let cart = state.carts().merge(user, lines).await;
    tracing::info!(
        user_id = %user,
        lines = request.items.len(),
        total_items = cart.total_items(),
        "Merged guest cart"
    );
    Ok(Json(cart))
}

fn product(state: &ApiState, product_id: ProductId) -> Result<ProductSnapshot> {
    state
        .catalog()
        .get(product_id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("product {product_id}")))
}

fn missing_line(product_id: ProductId) -> ApiError {
    ApiError::NotFound(format!("no cart line for product {product_id}"))
}
