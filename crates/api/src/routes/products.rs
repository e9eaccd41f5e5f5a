//! Product route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use storefront_cart_core::{ProductId, ProductSnapshot};

use crate::error::{ApiError, Result};
use crate::state::ApiState;

/// `GET /api/products/{product_id}` (public)
pub async fn show(
    State(state): State<ApiState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<ProductSnapshot>> {
    state
        .catalog()
        .get(product_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("product {product_id}")))
}
