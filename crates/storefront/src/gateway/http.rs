//! HTTP implementation of the cart gateway.
//!
//! Uses `reqwest` with JSON bodies and bearer-token authentication.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use storefront_cart_core::{
    AddCartItemRequest, Cart, CartItem, MergeCartRequest, ProductId, ProductSnapshot, Quantity,
    UpdateCartItemRequest,
};
use tracing::{debug, instrument};
use url::Url;

use super::{CartGateway, GatewayError};
use crate::config::CartApiConfig;

/// Client for the remote cart API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct HttpCartGateway {
    inner: Arc<HttpCartGatewayInner>,
}

struct HttpCartGatewayInner {
    client: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl HttpCartGateway {
    /// Create a gateway for `config`.
    ///
    /// `token` is the session's bearer token; without one only public
    /// endpoints (products) succeed.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Http` if the HTTP client cannot be built.
    pub fn new(config: &CartApiConfig, token: Option<SecretString>) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(HttpCartGatewayInner {
                client,
                base_url: config.base_url.clone(),
                token,
            }),
        })
    }

    /// Whether requests carry a session token.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.token.is_some()
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, GatewayError> {
        let url = self.inner.base_url.join(path)?;
        let builder = self.inner.client.request(method, url);

        Ok(match &self.inner.token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        })
    }

    /// Send a request and decode a JSON body.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        let body = self.send(request).await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse cart API response"
            );
            GatewayError::Parse(e)
        })
    }

    /// Send a request and return the body text of a successful response.
    async fn send(&self, request: RequestBuilder) -> Result<String, GatewayError> {
        let response = request.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(GatewayError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        match status {
            s if s.is_success() => Ok(body),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(GatewayError::Unauthorized),
            StatusCode::NOT_FOUND => Err(GatewayError::NotFound(not_found_detail(&body))),
            s => {
                tracing::error!(
                    status = %s,
                    body = %body.chars().take(500).collect::<String>(),
                    "Cart API returned non-success status"
                );
                Err(GatewayError::Status {
                    status: s.as_u16(),
                    body: body.chars().take(200).collect(),
                })
            }
        }
    }
}

impl CartGateway for HttpCartGateway {
    #[instrument(skip(self))]
    async fn fetch_cart(&self) -> Result<Cart, GatewayError> {
        let cart: Cart = self
            .send_json(self.request(Method::GET, "api/cart")?)
            .await?;
        debug!(cart_id = %cart.id, lines = cart.items.len(), "Fetched remote cart");
        Ok(cart)
    }

    #[instrument(skip(self))]
    async fn add_item(
        &self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<CartItem, GatewayError> {
        let body = AddCartItemRequest {
            product_id,
            quantity,
        };
        self.send_json(self.request(Method::POST, "api/cart/items")?.json(&body))
            .await
    }

    #[instrument(skip(self))]
    async fn update_item(
        &self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<CartItem, GatewayError> {
        let path = format!("api/cart/items/{product_id}");
        self.send_json(
            self.request(Method::PATCH, &path)?
                .json(&UpdateCartItemRequest { quantity }),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn remove_item(&self, product_id: ProductId) -> Result<(), GatewayError> {
        let path = format!("api/cart/items/{product_id}");
        self.send(self.request(Method::DELETE, &path)?).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<(), GatewayError> {
        self.send(self.request(Method::DELETE, "api/cart")?).await?;
        Ok(())
    }

    #[instrument(skip(self, items), fields(lines = items.len()))]
    async fn merge(&self, items: &[CartItem]) -> Result<(), GatewayError> {
        let body = MergeCartRequest {
            items: items.to_vec(),
        };
        self.send(self.request(Method::POST, "api/cart/merge")?.json(&body))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_product(&self, product_id: ProductId) -> Result<ProductSnapshot, GatewayError> {
        let path = format!("api/products/{product_id}");
        self.send_json(self.request(Method::GET, &path)?).await
    }
}

/// The server's 404 body without its own "Not found" prefix.
fn not_found_detail(body: &str) -> String {
    let body = body.trim();
    body.strip_prefix("Not found:")
        .map_or(body, str::trim_start)
        .to_string()
}
