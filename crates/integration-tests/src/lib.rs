//! End-to-end tests for the storefront cart.
//!
//! Each test starts the reference cart API on an ephemeral port and drives
//! it through [`HttpCartGateway`], the same client the CLI uses. The guest
//! cart lives in [`MemoryStorage`] so tests can inspect it directly.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storefront-cart-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::time::Duration;

use secrecy::SecretString;
use storefront_cart::CartReconciler;
use storefront_cart::config::CartApiConfig;
use storefront_cart::gateway::HttpCartGateway;
use storefront_cart::local::MemoryStorage;
use storefront_cart_api::{ApiConfig, ApiState, Catalog, app};
use storefront_cart_core::UserId;
use tokio::task::JoinHandle;

/// Bearer token for [`ALICE`].
pub const ALICE_TOKEN: &str = "q8Zr2LmX4vTn7KpW";
/// Bearer token for [`BOB`].
pub const BOB_TOKEN: &str = "Hb5cJ9sDf1GkR3yE";

pub const ALICE: UserId = UserId::new(1);
pub const BOB: UserId = UserId::new(2);

/// The cart reconciler under test.
pub type TestCart = CartReconciler<MemoryStorage, HttpCartGateway>;

/// A cart API running on a background task. Stopped on drop.
pub struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start the API with the seed catalog and the two test users.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let config = ApiConfig {
            host: "127.0.0.1".parse().expect("valid IP"),
            port: 0,
            tokens: HashMap::from([
                (ALICE_TOKEN.to_string(), ALICE),
                (BOB_TOKEN.to_string(), BOB),
            ]),
            catalog_path: None,
            sentry_dsn: None,
        };

        let listener = tokio::net::TcpListener::bind(config.socket_addr())
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        let router = app(ApiState::new(config, Catalog::seeded()));

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Test server error");
        });

        Self {
            base_url: format!("http://{addr}/"),
            client: reqwest::Client::new(),
            handle,
        }
    }

    /// Base URL of the API, ending in `/`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A cart reconciler talking to this server, plus a handle on its
    /// guest storage.
    ///
    /// # Panics
    ///
    /// Panics if the gateway cannot be built.
    #[must_use]
    pub fn cart(&self, token: Option<&str>) -> (TestCart, MemoryStorage) {
        let config = CartApiConfig::for_base_url(&self.base_url).expect("valid base URL");
        let gateway = HttpCartGateway::new(
            &config,
            token.map(|t| SecretString::from(t.to_string())),
        )
        .expect("Failed to build gateway");
        let storage = MemoryStorage::new();

        (
            CartReconciler::new(storage.clone(), gateway, Duration::from_secs(60)),
            storage,
        )
    }

    /// Raw request against the API, bypassing the gateway.
    #[must_use]
    pub fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{path}", self.base_url));
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Fetch a user's cart straight from the API.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the body is not JSON.
    pub async fn remote_cart(&self, token: &str) -> serde_json::Value {
        self.request(reqwest::Method::GET, "api/cart", Some(token))
            .send()
            .await
            .expect("Cart request failed")
            .json()
            .await
            .expect("Cart response was not JSON")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
