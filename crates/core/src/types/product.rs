//! Product data carried on cart lines.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// Product data attached to a cart line.
///
/// For guest cart lines this is a snapshot taken when the item was added.
/// For remote cart lines it is the server's authoritative product record.
/// Optional fields are `None` when the source did not provide them; absence
/// never means "empty" or "zero".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    /// Product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price, serialized as a decimal string.
    pub price: Decimal,
    /// URL slug.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Primary image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Units in stock at the time of the snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i32>,
}

impl ProductSnapshot {
    /// Create a snapshot with only the required fields set.
    #[must_use]
    pub fn new(id: ProductId, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            slug: None,
            image_url: None,
            stock: None,
        }
    }
}
