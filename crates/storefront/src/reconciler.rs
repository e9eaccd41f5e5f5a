//! Cart reconciliation between the guest cart and the account cart.
//!
//! [`CartReconciler`] is the single cart object the application talks to.
//! It selects the source of truth from the observed session (guest storage
//! while anonymous, the remote API once authenticated), exposes one read
//! model regardless of the backing store, and runs the one-time merge of
//! the guest cart into the account cart when a user logs in.
//!
//! # Example
//!
//! ```rust,ignore
//! let cart = CartReconciler::new(FileStorage::new(".cart"), gateway, Duration::from_secs(60));
//!
//! cart.add_to_cart(product, 1).await?;          // guest cart
//! cart.observe_session(Some(user_id)).await;     // merges guest cart once
//! let summary = cart.summary().await;            // now the account cart
//! ```

use std::future::Future;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Serialize;
use storefront_cart_core::{
    Cart, CartItem, CartOwnership, ProductId, ProductSnapshot, Quantity, UserId,
};
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, instrument, warn};

use crate::error::{CartError, Result, clear_sentry_user, report, set_sentry_user};
use crate::events::{CartEvent, CartMutation, MutationStatus, MutationTracker};
use crate::gateway::{CartGateway, GatewayError, RemoteCartCache};
use crate::local::{GuestStorage, LocalCartStore};
use crate::merge::{MergeOutcome, MergeState, SingleFlight};

const EVENT_CAPACITY: usize = 32;

/// Which store currently backs the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartSource {
    /// Guest cart in local storage.
    Local,
    /// Account cart on the remote API.
    Remote(UserId),
}

/// Read model of the active cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    /// Lines in insertion order.
    pub items: Vec<CartItem>,
    /// Sum of line quantities.
    pub total_items: u64,
    /// Sum of `price * quantity`.
    pub total_price: Decimal,
    /// Which store the lines came from.
    pub ownership: CartOwnership,
    /// A merge is in progress and the view may be about to change.
    pub is_loading: bool,
}

impl From<Cart> for CartSummary {
    fn from(cart: Cart) -> Self {
        Self {
            total_items: cart.total_items(),
            total_price: cart.total_price(),
            ownership: cart.ownership,
            items: cart.items,
            is_loading: false,
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    user: Option<UserId>,
    merge: MergeState,
}

/// The application's cart.
///
/// Owned by the root of the application and shared by reference (or `Arc`).
pub struct CartReconciler<S, G> {
    local: Mutex<LocalCartStore<S>>,
    gateway: G,
    cache: RemoteCartCache,
    session: Mutex<SessionState>,
    merge_flight: SingleFlight,
    mutations: MutationTracker,
    events: broadcast::Sender<CartEvent>,
}

impl<S: GuestStorage, G: CartGateway> CartReconciler<S, G> {
    /// Create a reconciler, loading the guest cart from `storage`.
    ///
    /// Remote cart reads are cached for `cache_ttl`. The session starts
    /// anonymous until [`observe_session`](Self::observe_session) is called.
    pub fn new(storage: S, gateway: G, cache_ttl: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            local: Mutex::new(LocalCartStore::load(storage)),
            gateway,
            cache: RemoteCartCache::new(cache_ttl),
            session: Mutex::new(SessionState::default()),
            merge_flight: SingleFlight::default(),
            mutations: MutationTracker::default(),
            events,
        }
    }

    /// Subscribe to cart notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.events.subscribe()
    }

    /// The remote cart gateway.
    #[must_use]
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Pending/error flags for a kind of mutation.
    #[must_use]
    pub fn mutation_status(&self, mutation: CartMutation) -> MutationStatus {
        self.mutations.status(mutation)
    }

    /// Current merge state of the session.
    pub async fn merge_state(&self) -> MergeState {
        self.session.lock().await.merge
    }

    /// The store that reads and writes currently target.
    pub async fn active_source(&self) -> CartSource {
        self.session
            .lock()
            .await
            .user
            .map_or(CartSource::Local, CartSource::Remote)
    }

    // =========================================================================
    // Session & Merge
    // =========================================================================

    /// Observe the authentication signal.
    ///
    /// Call this whenever the session may have changed. `None` ends any login
    /// session. A user that differs from the last observed one starts a new
    /// login session and triggers the guest cart merge; observing the same
    /// user again while the merge is still pending retries it.
    #[instrument(skip(self))]
    pub async fn observe_session(&self, user: Option<UserId>) -> MergeOutcome {
        let Some(user) = user else {
            let mut session = self.session.lock().await;
            if let Some(previous) = session.user.take() {
                info!(user_id = %previous, "Session ended");
                clear_sentry_user();
            }
            session.merge = MergeState::Anonymous;
            return MergeOutcome::Skipped;
        };

        {
            let mut session = self.session.lock().await;
            if session.user != Some(user) {
                info!(user_id = %user, "Session started");
                set_sentry_user(&user);
                session.user = Some(user);
                session.merge = MergeState::MergePending;
            }
            if session.merge == MergeState::Merged {
                return MergeOutcome::Skipped;
            }
        }

        self.merge_guest_cart(user).await
    }

    /// Retry a merge that failed earlier in this login session.
    ///
    /// Returns `Skipped` if the session has already merged.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotAuthenticated` if no user is observed.
    #[instrument(skip(self))]
    pub async fn retry_merge(&self) -> Result<MergeOutcome> {
        let user = self
            .session
            .lock()
            .await
            .user
            .ok_or(CartError::NotAuthenticated)?;

        Ok(self.merge_guest_cart(user).await)
    }

    async fn merge_guest_cart(&self, user: UserId) -> MergeOutcome {
        let Some(_flight) = self.merge_flight.try_acquire() else {
            debug!(user_id = %user, "Merge already in flight");
            return MergeOutcome::InFlight;
        };

        // The previous flight may have finished between the state check and
        // taking the guard
        if !self.is_merge_pending(user).await {
            return MergeOutcome::Skipped;
        }

        let items = self.local.lock().await.items().to_vec();
        if items.is_empty() {
            self.complete_merge(user).await;
            debug!(user_id = %user, "Guest cart empty, nothing to merge");
            return MergeOutcome::NothingToMerge;
        }

        let lines = items.len();
        info!(user_id = %user, lines, "Merging guest cart");
        self.mutations.begin(CartMutation::Merge);

        match self.gateway.merge(&items).await {
            Ok(()) => {
                // Lines added while the request was out were never sent
                if let Err(e) = self.local.lock().await.remove_submitted(&items) {
                    // The server already holds these lines; the session still
                    // counts as merged so they are never submitted twice
                    report(CartMutation::Merge, &CartError::from(e));
                }
                self.cache.invalidate(user).await;
                self.complete_merge(user).await;
                self.mutations.succeed(CartMutation::Merge);

                info!(user_id = %user, lines, "Guest cart merged");
                self.notify(CartEvent::Merged { lines });
                MergeOutcome::Merged { lines }
            }
            Err(e) => {
                let error = CartError::from(e);
                self.fail(CartMutation::Merge, &error);
                MergeOutcome::Failed {
                    message: error.user_message(),
                }
            }
        }
    }

    async fn is_merge_pending(&self, user: UserId) -> bool {
        let session = self.session.lock().await;
        session.user == Some(user) && session.merge == MergeState::MergePending
    }

    async fn complete_merge(&self, user: UserId) {
        let mut session = self.session.lock().await;
        if session.user == Some(user) {
            session.merge = MergeState::Merged;
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// The active cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Gateway` if the remote cart cannot be fetched.
    pub async fn cart(&self) -> Result<Cart> {
        match self.active_source().await {
            CartSource::Local => Ok(self.local.lock().await.cart()),
            CartSource::Remote(user) => self.remote_cart(user).await,
        }
    }

    /// Read model of the active cart.
    ///
    /// Never fails: if the remote cart cannot be fetched an empty account
    /// cart is returned and the error is logged.
    pub async fn summary(&self) -> CartSummary {
        let cart = match self.cart().await {
            Ok(cart) => cart,
            Err(e) => {
                warn!(error = %e, "Failed to fetch cart, showing empty cart");
                Cart::empty_remote()
            }
        };

        CartSummary {
            is_loading: self.merge_flight.is_active(),
            ..CartSummary::from(cart)
        }
    }

    async fn remote_cart(&self, user: UserId) -> Result<Cart> {
        if let Some(cart) = self.cache.get(user).await {
            return Ok(cart);
        }

        let cart = self.gateway.fetch_cart().await?;
        self.cache.insert(user, cart.clone()).await;
        Ok(cart)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add units of a product, using `product` as the guest cart snapshot.
    ///
    /// Quantities below one are raised to one.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the active store rejects the change.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_to_cart(&self, product: ProductSnapshot, quantity: i64) -> Result<CartItem> {
        let quantity = Quantity::clamped(quantity);
        self.track(CartMutation::Add, self.add_snapshot(product, quantity))
            .await
    }

    /// Add units of a product by ID.
    ///
    /// While anonymous the product record is fetched from the API to
    /// snapshot it into the guest cart. Quantities below one are raised to one.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the product cannot be fetched or the active
    /// store rejects the change.
    #[instrument(skip(self))]
    pub async fn add_product(&self, product_id: ProductId, quantity: i64) -> Result<CartItem> {
        let quantity = Quantity::clamped(quantity);
        self.track(CartMutation::Add, self.add_by_id(product_id, quantity))
            .await
    }

    /// Remove a product's line. Removing an absent product is not an error.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the active store rejects the change.
    #[instrument(skip(self))]
    pub async fn remove_from_cart(&self, product_id: ProductId) -> Result<()> {
        self.track(CartMutation::Remove, self.remove(product_id))
            .await
    }

    /// Set the quantity of a product's line. Quantities below one are
    /// raised to one.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the active store rejects the change.
    #[instrument(skip(self))]
    pub async fn update_cart_item(&self, product_id: ProductId, quantity: i64) -> Result<()> {
        let quantity = Quantity::clamped(quantity);
        self.track(CartMutation::Update, self.update(product_id, quantity))
            .await
    }

    /// Remove every line from the active cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the active store rejects the change.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<()> {
        self.track(CartMutation::Clear, self.clear()).await
    }

    async fn add_snapshot(&self, product: ProductSnapshot, quantity: Quantity) -> Result<CartItem> {
        match self.active_source().await {
            CartSource::Local => Ok(self.local.lock().await.add_item(product, quantity)?),
            CartSource::Remote(user) => self.remote_add(user, product.id, quantity).await,
        }
    }

    async fn add_by_id(&self, product_id: ProductId, quantity: Quantity) -> Result<CartItem> {
        match self.active_source().await {
            CartSource::Local => {
                let product = self.gateway.fetch_product(product_id).await?;
                Ok(self.local.lock().await.add_item(product, quantity)?)
            }
            CartSource::Remote(user) => self.remote_add(user, product_id, quantity).await,
        }
    }

    async fn remote_add(
        &self,
        user: UserId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<CartItem> {
        let result = self.gateway.add_item(product_id, quantity).await;
        self.cache.invalidate(user).await;
        Ok(result?)
    }

    async fn remove(&self, product_id: ProductId) -> Result<()> {
        match self.active_source().await {
            CartSource::Local => {
                if !self.local.lock().await.remove_item(product_id)? {
                    debug!(%product_id, "Product not in guest cart");
                }
                Ok(())
            }
            CartSource::Remote(user) => {
                let result = self.gateway.remove_item(product_id).await;
                self.cache.invalidate(user).await;
                match result {
                    Err(GatewayError::NotFound(_)) => {
                        debug!(%product_id, "Product not in account cart");
                        Ok(())
                    }
                    result => Ok(result?),
                }
            }
        }
    }

    async fn update(&self, product_id: ProductId, quantity: Quantity) -> Result<()> {
        match self.active_source().await {
            CartSource::Local => {
                if !self
                    .local
                    .lock()
                    .await
                    .update_quantity(product_id, quantity)?
                {
                    debug!(%product_id, "Product not in guest cart");
                }
                Ok(())
            }
            CartSource::Remote(user) => {
                let result = self.gateway.update_item(product_id, quantity).await;
                self.cache.invalidate(user).await;
                result.map(|_| ()).map_err(CartError::from)
            }
        }
    }

    async fn clear(&self) -> Result<()> {
        match self.active_source().await {
            CartSource::Local => Ok(self.local.lock().await.clear()?),
            CartSource::Remote(user) => {
                let result = self.gateway.clear().await;
                self.cache.invalidate(user).await;
                Ok(result?)
            }
        }
    }

    /// Run a mutation with status tracking and notifications.
    async fn track<T>(
        &self,
        mutation: CartMutation,
        operation: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        self.mutations.begin(mutation);

        match operation.await {
            Ok(value) => {
                self.mutations.succeed(mutation);
                let ownership = match self.active_source().await {
                    CartSource::Local => CartOwnership::Local,
                    CartSource::Remote(_) => CartOwnership::Remote,
                };
                self.notify(CartEvent::Updated { ownership });
                Ok(value)
            }
            Err(e) => {
                self.fail(mutation, &e);
                Err(e)
            }
        }
    }

    fn fail(&self, mutation: CartMutation, error: &CartError) {
        report(mutation, error);
        self.mutations.fail(mutation, error.to_string());
        self.notify(CartEvent::Failed {
            mutation,
            message: error.user_message(),
        });
    }

    fn notify(&self, event: CartEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
