//! Core types for the storefront cart.
//!
//! This module provides type-safe wrappers for the cart domain.

pub mod cart;
pub mod id;
pub mod price;
pub mod product;
pub mod quantity;
pub mod requests;

pub use cart::{Cart, CartItem, CartItemId, CartOwnership};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use product::ProductSnapshot;
pub use quantity::{Quantity, QuantityError};
pub use requests::{AddCartItemRequest, MergeCartRequest, UpdateCartItemRequest};
