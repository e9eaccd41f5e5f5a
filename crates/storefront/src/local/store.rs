//! Guest cart store: an in-memory cache kept consistent with durable storage.

use chrono::Utc;
use storefront_cart_core::{Cart, CartItem, CartItemId, ProductId, ProductSnapshot, Quantity};
use tracing::{debug, warn};

use super::{GUEST_CART_KEY, GuestStorage, StorageError};

/// The anonymous cart.
///
/// Every mutation serializes the new item list and writes it to storage
/// before swapping it into the in-memory cache. If the write fails the cache
/// keeps its previous contents, so the cache never shows a mutation that a
/// reload would lose.
#[derive(Debug)]
pub struct LocalCartStore<S> {
    storage: S,
    items: Vec<CartItem>,
}

impl<S: GuestStorage> LocalCartStore<S> {
    /// Load the guest cart from `storage`.
    ///
    /// A missing key is an empty cart. An unreadable or corrupt value is
    /// also treated as an empty cart and logged; it is overwritten by the
    /// next mutation.
    pub fn load(storage: S) -> Self {
        let items = match storage.get(GUEST_CART_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<Vec<CartItem>>(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "Discarding corrupt guest cart");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read guest cart, starting empty");
                Vec::new()
            }
        };

        debug!(lines = items.len(), "Guest cart loaded");
        Self { storage, items }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// The guest cart view.
    #[must_use]
    pub fn cart(&self) -> Cart {
        Cart::local(self.items.clone())
    }

    /// Whether the guest cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The storage backend.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Add `quantity` units of a product.
    ///
    /// An existing line for the product has its quantity increased; otherwise
    /// a new line is appended with a fresh local ID. Returns the resulting line.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the updated cart cannot be persisted.
    pub fn add_item(
        &mut self,
        product: ProductSnapshot,
        quantity: Quantity,
    ) -> Result<CartItem, StorageError> {
        let mut items = self.items.clone();

        let line = if let Some(existing) = items.iter_mut().find(|i| i.product_id == product.id) {
            existing.quantity = existing.quantity.saturating_add(quantity);
            existing.clone()
        } else {
            let line = CartItem {
                id: self.next_local_id(),
                product_id: product.id,
                quantity,
                product,
            };
            items.push(line.clone());
            line
        };

        self.commit(items)?;
        Ok(line)
    }

    /// Remove the line for a product. Returns `false` if there was none.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the updated cart cannot be persisted.
    pub fn remove_item(&mut self, product_id: ProductId) -> Result<bool, StorageError> {
        if !self.items.iter().any(|i| i.product_id == product_id) {
            return Ok(false);
        }

        let items = self
            .items
            .iter()
            .filter(|i| i.product_id != product_id)
            .cloned()
            .collect();
        self.commit(items)?;
        Ok(true)
    }

    /// Set the quantity of a product's line. Returns `false` if there was none.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the updated cart cannot be persisted.
    pub fn update_quantity(
        &mut self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<bool, StorageError> {
        let mut items = self.items.clone();
        let Some(line) = items.iter_mut().find(|i| i.product_id == product_id) else {
            return Ok(false);
        };

        line.quantity = quantity;
        self.commit(items)?;
        Ok(true)
    }

    /// Empty the cart and delete the storage key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the key cannot be removed; the cache is
    /// left untouched in that case.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.storage.remove(GUEST_CART_KEY)?;
        self.items.clear();
        Ok(())
    }

    /// Take lines that were handed to the server out of the cart.
    ///
    /// Each submitted quantity is subtracted from the product's current line,
    /// so units added after `submitted` was read stay behind. The storage key
    /// is deleted once nothing is left.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the updated cart cannot be persisted.
    pub fn remove_submitted(&mut self, submitted: &[CartItem]) -> Result<(), StorageError> {
        let items: Vec<CartItem> = self
            .items
            .iter()
            .filter_map(|line| {
                let sent: u32 = submitted
                    .iter()
                    .filter(|s| s.product_id == line.product_id)
                    .map(|s| s.quantity.get())
                    .sum();
                let quantity = Quantity::new(line.quantity.get().saturating_sub(sent)).ok()?;
                Some(CartItem {
                    quantity,
                    ..line.clone()
                })
            })
            .collect();

        if items.is_empty() {
            return self.clear();
        }
        self.commit(items)
    }

    fn commit(&mut self, items: Vec<CartItem>) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&items)?;
        self.storage.set(GUEST_CART_KEY, &raw)?;
        self.items = items;
        Ok(())
    }

    /// A timestamp-based ID, bumped until it is unique within the cart.
    fn next_local_id(&self) -> CartItemId {
        let mut millis = Utc::now().timestamp_millis();
        loop {
            let id = CartItemId::local(millis);
            if !self.items.iter().any(|i| i.id == id) {
                return id;
            }
            millis += 1;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::local::MemoryStorage;

    fn product(id: i32, price_cents: i64) -> ProductSnapshot {
        ProductSnapshot::new(
            ProductId::new(id),
            format!("Product {id}"),
            Decimal::new(price_cents, 2),
        )
    }

    fn qty(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    /// Storage whose writes always fail.
    struct ReadOnlyStorage(MemoryStorage);

    impl GuestStorage for ReadOnlyStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }

        fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }
    }

    #[test]
    fn test_add_same_product_sums_quantity() {
        let mut store = LocalCartStore::load(MemoryStorage::new());

        store.add_item(product(1, 500), qty(1)).unwrap();
        let line = store.add_item(product(1, 500), qty(2)).unwrap();

        assert_eq!(store.items().len(), 1);
        assert_eq!(line.quantity.get(), 3);
        assert_eq!(store.items()[0].product_id, ProductId::new(1));
    }

    #[test]
    fn test_add_keeps_insertion_order_and_unique_ids() {
        let mut store = LocalCartStore::load(MemoryStorage::new());

        store.add_item(product(2, 100), qty(1)).unwrap();
        store.add_item(product(1, 100), qty(1)).unwrap();
        store.add_item(product(3, 100), qty(1)).unwrap();

        let ids: Vec<i32> = store.items().iter().map(|i| i.product_id.as_i32()).collect();
        assert_eq!(ids, vec![2, 1, 3]);

        let line_ids: std::collections::HashSet<_> = store.items().iter().map(|i| &i.id).collect();
        assert_eq!(line_ids.len(), 3);
        assert!(store.items().iter().all(|i| matches!(i.id, CartItemId::Local(_))));
    }

    #[test]
    fn test_mutations_persist_to_storage() {
        let storage = MemoryStorage::new();
        let mut store = LocalCartStore::load(storage.clone());

        store.add_item(product(1, 250), qty(2)).unwrap();
        store.add_item(product(2, 100), qty(1)).unwrap();
        store.update_quantity(ProductId::new(2), qty(5)).unwrap();

        let reloaded = LocalCartStore::load(storage);
        assert_eq!(reloaded.items(), store.items());
        assert_eq!(reloaded.cart().total_items(), 7);
    }

    #[test]
    fn test_remove_missing_product_is_noop() {
        let mut store = LocalCartStore::load(MemoryStorage::new());
        store.add_item(product(1, 100), qty(1)).unwrap();

        assert!(!store.remove_item(ProductId::new(99)).unwrap());
        assert_eq!(store.items().len(), 1);

        assert!(store.remove_item(ProductId::new(1)).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_missing_product_is_noop() {
        let mut store = LocalCartStore::load(MemoryStorage::new());
        assert!(!store.update_quantity(ProductId::new(1), qty(4)).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear_removes_storage_key() {
        let storage = MemoryStorage::new();
        let mut store = LocalCartStore::load(storage.clone());
        store.add_item(product(1, 100), qty(1)).unwrap();
        assert!(storage.contains(GUEST_CART_KEY));

        store.clear().unwrap();
        assert!(store.is_empty());
        assert!(!storage.contains(GUEST_CART_KEY));
    }

    #[test]
    fn test_remove_submitted_keeps_later_additions() {
        let storage = MemoryStorage::new();
        let mut store = LocalCartStore::load(storage.clone());
        store.add_item(product(1, 100), qty(2)).unwrap();
        store.add_item(product(2, 100), qty(1)).unwrap();
        let submitted = store.items().to_vec();

        store.add_item(product(1, 100), qty(3)).unwrap();
        store.add_item(product(3, 100), qty(1)).unwrap();
        store.remove_submitted(&submitted).unwrap();

        let left: Vec<(i32, u32)> = store
            .items()
            .iter()
            .map(|i| (i.product_id.as_i32(), i.quantity.get()))
            .collect();
        assert_eq!(left, vec![(1, 3), (3, 1)]);
        assert_eq!(LocalCartStore::load(storage).items(), store.items());
    }

    #[test]
    fn test_remove_submitted_clears_untouched_cart() {
        let storage = MemoryStorage::new();
        let mut store = LocalCartStore::load(storage.clone());
        store.add_item(product(1, 100), qty(2)).unwrap();
        let submitted = store.items().to_vec();

        store.remove_submitted(&submitted).unwrap();
        assert!(store.is_empty());
        assert!(!storage.contains(GUEST_CART_KEY));
    }

    #[test]
    fn test_corrupt_storage_loads_empty() {
        let mut storage = MemoryStorage::new();
        storage.set(GUEST_CART_KEY, "{not json").unwrap();

        let mut store = LocalCartStore::load(storage.clone());
        assert!(store.is_empty());

        // The next mutation replaces the corrupt value
        store.add_item(product(1, 100), qty(1)).unwrap();
        assert_eq!(LocalCartStore::load(storage).items().len(), 1);
    }

    #[test]
    fn test_failed_write_leaves_cache_unchanged() {
        let mut seeded = LocalCartStore::load(MemoryStorage::new());
        seeded.add_item(product(1, 100), qty(1)).unwrap();
        let inner = seeded.storage().clone();

        let mut store = LocalCartStore::load(ReadOnlyStorage(inner));
        assert_eq!(store.items().len(), 1);

        assert!(store.add_item(product(1, 100), qty(4)).is_err());
        assert!(store.add_item(product(2, 100), qty(1)).is_err());
        assert!(store.remove_item(ProductId::new(1)).is_err());
        assert!(store.clear().is_err());

        assert_eq!(store.items().len(), 1);
        assert_eq!(store.items()[0].quantity.get(), 1);
    }
}
