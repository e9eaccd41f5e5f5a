//! In-memory cache of the remote cart view.

use std::time::Duration;

use moka::future::Cache;
use storefront_cart_core::{Cart, UserId};

/// Remote carts keyed by user.
///
/// Entries expire after the configured TTL and are invalidated after every
/// remote mutation, so a stale view survives at most one TTL when the cart
/// is changed from elsewhere.
#[derive(Clone)]
pub struct RemoteCartCache {
    carts: Cache<UserId, Cart>,
}

impl RemoteCartCache {
    /// Create a cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            carts: Cache::builder().max_capacity(100).time_to_live(ttl).build(),
        }
    }

    /// Cached cart for `user`, if still fresh.
    pub async fn get(&self, user: UserId) -> Option<Cart> {
        self.carts.get(&user).await
    }

    /// Remember `cart` as the current view for `user`.
    pub async fn insert(&self, user: UserId, cart: Cart) {
        self.carts.insert(user, cart).await;
    }

    /// Forget the view for `user` so the next read refetches.
    pub async fn invalidate(&self, user: UserId) {
        self.carts.invalidate(&user).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_get_invalidate() {
        let cache = RemoteCartCache::new(Duration::from_secs(60));
        let user = UserId::new(1);

        assert!(cache.get(user).await.is_none());

        cache.insert(user, Cart::empty_remote()).await;
        assert_eq!(cache.get(user).await, Some(Cart::empty_remote()));
        assert!(cache.get(UserId::new(2)).await.is_none());

        cache.invalidate(user).await;
        assert!(cache.get(user).await.is_none());
    }
}
