//! Product catalog served by the cart API.
//!
//! Products are read-only. The catalog is either the built-in seed set or a
//! JSON array of product records loaded at startup.

use std::collections::HashMap;
use std::path::Path;

use rust_decimal::Decimal;
use storefront_cart_core::{ProductId, ProductSnapshot};
use thiserror::Error;

/// Errors loading a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Duplicate product id {0} in catalog")]
    Duplicate(ProductId),
}

/// Products known to the API, keyed by ID.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: HashMap<ProductId, ProductSnapshot>,
}

impl Catalog {
    /// Build a catalog from product records.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Duplicate` if two records share an ID.
    pub fn new(products: impl IntoIterator<Item = ProductSnapshot>) -> Result<Self, CatalogError> {
        let mut map = HashMap::new();
        for product in products {
            let id = product.id;
            if map.insert(id, product).is_some() {
                return Err(CatalogError::Duplicate(id));
            }
        }
        Ok(Self { products: map })
    }

    /// The built-in seed catalog.
    #[must_use]
    pub fn seeded() -> Self {
        let seed = [
            (1, "Pineapple", 400, "pineapple", 120),
            (2, "Mango", 250, "mango", 80),
            (3, "Papaya", 325, "papaya", 40),
            (4, "Passion Fruit", 150, "passion-fruit", 200),
            (5, "Dragon Fruit", 599, "dragon-fruit", 15),
        ];

        let products = seed
            .into_iter()
            .map(|(id, name, cents, slug, stock)| ProductSnapshot {
                slug: Some(slug.to_string()),
                image_url: Some(format!("/static/images/products/{slug}.jpg")),
                stock: Some(stock),
                ..ProductSnapshot::new(ProductId::new(id), name, Decimal::new(cents, 2))
            })
            .map(|product| (product.id, product))
            .collect();

        Self { products }
    }

    /// Load a catalog from a JSON file holding an array of product records.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the file cannot be read or parsed, or holds
    /// duplicate IDs.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        let products: Vec<ProductSnapshot> = serde_json::from_str(&raw)?;
        let catalog = Self::new(products)?;
        tracing::info!(path = %path.display(), products = catalog.len(), "Loaded product catalog");
        Ok(catalog)
    }

    /// Look up a product.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&ProductSnapshot> {
        self.products.get(&id)
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_catalog() {
        let catalog = Catalog::seeded();
        assert_eq!(catalog.len(), 5);

        let pineapple = catalog.get(ProductId::new(1)).unwrap();
        assert_eq!(pineapple.name, "Pineapple");
        assert_eq!(pineapple.price, Decimal::new(400, 2));
        assert!(catalog.get(ProductId::new(99)).is_none());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let product = ProductSnapshot::new(ProductId::new(7), "Kiwi", Decimal::ONE);
        let result = Catalog::new([product.clone(), product]);
        assert!(matches!(result, Err(CatalogError::Duplicate(id)) if id == ProductId::new(7)));
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("cart-catalog-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"[{"id": 10, "name": "Lychee", "price": "3.10"}, {"id": 11, "name": "Guava", "price": "1.75", "stock": 4}]"#,
        )
        .unwrap();

        let catalog = Catalog::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(ProductId::new(11)).unwrap().stock, Some(4));
    }
}
