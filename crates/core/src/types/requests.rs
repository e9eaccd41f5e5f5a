//! Request bodies exchanged with the cart API.

use serde::{Deserialize, Serialize};

use super::cart::CartItem;
use super::id::ProductId;
use super::quantity::Quantity;

/// Body of `POST /api/cart/items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

/// Body of `PATCH /api/cart/items/{productId}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: Quantity,
}

/// Body of `POST /api/cart/merge`: the full guest cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeCartRequest {
    pub items: Vec<CartItem>,
}
