//! In-memory cart storage for the cart API.
//!
//! One cart per user, created on first access. Line IDs are unique across
//! all carts. Every operation takes the write lock once, so a merge is
//! applied all-or-nothing with respect to concurrent requests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};

use storefront_cart_core::{
    Cart, CartId, CartItem, CartItemId, CartOwnership, ProductId, ProductSnapshot, Quantity,
    UserId,
};
use tokio::sync::RwLock;

/// Carts keyed by owner.
#[derive(Debug)]
pub struct CartRepository {
    carts: RwLock<HashMap<UserId, Cart>>,
    next_cart_id: AtomicI32,
    next_line_id: AtomicI32,
}

impl Default for CartRepository {
    fn default() -> Self {
        Self {
            carts: RwLock::new(HashMap::new()),
            next_cart_id: AtomicI32::new(1),
            next_line_id: AtomicI32::new(1),
        }
    }
}

impl CartRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The user's cart; an empty cart if they have never touched it.
    pub async fn get(&self, user: UserId) -> Cart {
        if let Some(cart) = self.carts.read().await.get(&user) {
            return cart.clone();
        }
        self.carts
            .write()
            .await
            .entry(user)
            .or_insert_with(|| self.new_cart())
            .clone()
    }

    /// Add units of a product, summing into an existing line.
    pub async fn add(&self, user: UserId, product: ProductSnapshot, quantity: Quantity) -> CartItem {
        let mut carts = self.carts.write().await;
        let cart = carts.entry(user).or_insert_with(|| self.new_cart());
        self.add_line(cart, product, quantity)
    }

    /// Set the quantity of a product's line. `None` if there is no such line.
    pub async fn update(
        &self,
        user: UserId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Option<CartItem> {
        let mut carts = self.carts.write().await;
        let item = carts
            .get_mut(&user)?
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)?;
        item.quantity = quantity;
        Some(item.clone())
    }

    /// Remove a product's line. Returns whether a line was removed.
    pub async fn remove(&self, user: UserId, product_id: ProductId) -> bool {
        let mut carts = self.carts.write().await;
        let Some(cart) = carts.get_mut(&user) else {
            return false;
        };
        let before = cart.items.len();
        cart.items.retain(|item| item.product_id != product_id);
        cart.items.len() != before
    }

    /// Remove every line from the user's cart.
    pub async fn clear(&self, user: UserId) {
        if let Some(cart) = self.carts.write().await.get_mut(&user) {
            cart.items.clear();
        }
    }

    /// Add every line in one step and return the resulting cart.
    ///
    /// Callers validate the lines first; nothing here can fail halfway.
    pub async fn merge(&self, user: UserId, lines: Vec<(ProductSnapshot, Quantity)>) -> Cart {
        let mut carts = self.carts.write().await;
        let cart = carts.entry(user).or_insert_with(|| self.new_cart());
        for (product, quantity) in lines {
            self.add_line(cart, product, quantity);
        }
        cart.clone()
    }

    fn add_line(&self, cart: &mut Cart, product: ProductSnapshot, quantity: Quantity) -> CartItem {
        if let Some(item) = cart.items.iter_mut().find(|item| item.product_id == product.id) {
            item.quantity = item.quantity.saturating_add(quantity);
            item.product = product;
            return item.clone();
        }

        let item = CartItem {
            id: CartItemId::Remote(self.next_line_id.fetch_add(1, Ordering::Relaxed)),
            product_id: product.id,
            quantity,
            product,
        };
        cart.items.push(item.clone());
        item
    }

    fn new_cart(&self) -> Cart {
        Cart {
            id: CartId::new(self.next_cart_id.fetch_add(1, Ordering::Relaxed)),
            items: Vec::new(),
            ownership: CartOwnership::Remote,
        }
    }
}
