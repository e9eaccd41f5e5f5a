//! Cart and cart line types.
//!
//! The same shapes are used for the guest cart kept in local storage and for
//! the remote cart returned by the cart API, so consumers never need to know
//! which one they are looking at.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CartId, ProductId};
use super::product::ProductSnapshot;
use super::quantity::Quantity;

/// Identifier of a cart line.
///
/// Guest lines get a client-generated string; remote lines carry the
/// server-assigned integer. Serialized untagged, so JSON holds either a
/// string or a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CartItemId {
    /// Server-assigned line ID.
    Remote(i32),
    /// Client-generated line ID (`local-<millis>`).
    Local(String),
}

impl CartItemId {
    /// Build a local line ID from a millisecond timestamp.
    #[must_use]
    pub fn local(millis: i64) -> Self {
        Self::Local(format!("local-{millis}"))
    }
}

impl std::fmt::Display for CartItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(id) => write!(f, "{id}"),
            Self::Local(id) => f.write_str(id),
        }
    }
}

/// A line item in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Line ID.
    pub id: CartItemId,
    /// Product on this line.
    pub product_id: ProductId,
    /// Units of the product.
    pub quantity: Quantity,
    /// Product data for display and pricing.
    pub product: ProductSnapshot,
}

impl CartItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity.get())
    }
}

/// Who owns a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartOwnership {
    /// Guest cart held in local storage.
    Local,
    /// Cart owned by the authenticated account on the server.
    Remote,
}

/// A shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Cart ID ([`CartId::LOCAL`] for the guest cart).
    pub id: CartId,
    /// Lines in insertion order.
    pub items: Vec<CartItem>,
    /// Owner of the cart. Not part of the wire format.
    #[serde(skip, default = "remote_ownership")]
    pub ownership: CartOwnership,
}

const fn remote_ownership() -> CartOwnership {
    CartOwnership::Remote
}

impl Cart {
    /// Build the guest cart view over a list of local lines.
    #[must_use]
    pub const fn local(items: Vec<CartItem>) -> Self {
        Self {
            id: CartId::LOCAL,
            items,
            ownership: CartOwnership::Local,
        }
    }

    /// An empty remote cart, used when the server has nothing to show.
    #[must_use]
    pub const fn empty_remote() -> Self {
        Self {
            id: CartId::LOCAL,
            items: Vec::new(),
            ownership: CartOwnership::Remote,
        }
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity.get()))
            .sum()
    }

    /// Sum of `price * quantity` across all lines.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Find the line for a product.
    #[must_use]
    pub fn find(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(product: i32, price_cents: i64, quantity: u32) -> CartItem {
        CartItem {
            id: CartItemId::Remote(product),
            product_id: ProductId::new(product),
            quantity: Quantity::new(quantity).unwrap(),
            product: ProductSnapshot::new(
                ProductId::new(product),
                format!("Product {product}"),
                Decimal::new(price_cents, 2),
            ),
        }
    }

    #[test]
    fn test_totals() {
        let cart = Cart::local(vec![item(1, 1000, 3), item(2, 250, 2)]);
        assert_eq!(cart.total_items(), 5);
        assert_eq!(cart.total_price(), Decimal::new(3500, 2));
    }

    #[test]
    fn test_empty_totals() {
        let cart = Cart::empty_remote();
        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.total_price(), Decimal::ZERO);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_item_id_untagged() {
        let remote: CartItemId = serde_json::from_str("12").unwrap();
        assert_eq!(remote, CartItemId::Remote(12));

        let local: CartItemId = serde_json::from_str("\"local-1700000000000\"").unwrap();
        assert_eq!(local, CartItemId::local(1_700_000_000_000));
    }

    #[test]
    fn test_remote_cart_wire_format() {
        let json = r#"{
            "id": 9,
            "items": [
                {"id": 4, "productId": 1, "quantity": 3,
                 "product": {"id": 1, "name": "Pineapple", "price": "4.00"}}
            ]
        }"#;
        let cart: Cart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.id, CartId::new(9));
        assert_eq!(cart.ownership, CartOwnership::Remote);
        assert_eq!(cart.find(ProductId::new(1)).unwrap().quantity.get(), 3);
        assert_eq!(cart.total_price(), Decimal::new(1200, 2));
    }
}
