//! Reference remote cart API.
//!
//! An Axum server holding one cart per authenticated user in memory, plus a
//! read-only product catalog. It implements the endpoints the storefront
//! cart's gateway talks to.
//!
//! # Authentication
//!
//! Cart endpoints require `Authorization: Bearer <token>`; tokens map to
//! user IDs through `CART_API_TOKENS`. Product endpoints are public.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod store;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

pub use catalog::{Catalog, CatalogError};
pub use config::{ApiConfig, ConfigError};
pub use error::ApiError;
pub use state::ApiState;

/// Build the API router with its state applied.
pub fn app(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use storefront_cart_core::UserId;
    use tower::ServiceExt;

    use super::*;

    const TOKEN: &str = "q8Zr2LmX4vTn7KpW";
    const OTHER_TOKEN: &str = "Hb5cJ9sDf1GkR3yE";

    fn test_app() -> Router {
        let config = ApiConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            tokens: HashMap::from([
                (TOKEN.to_string(), UserId::new(1)),
                (OTHER_TOKEN.to_string(), UserId::new(2)),
            ]),
            catalog_path: None,
            sentry_dsn: None,
        };
        app(ApiState::new(config, Catalog::seeded()))
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app();
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cart_requires_token() {
        let app = test_app();

        let (status, _) = call(&app, Method::GET, "/api/cart", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(&app, Method::GET, "/api/cart", Some("not-a-real-token"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_add_update_remove() {
        let app = test_app();

        let (status, item) = call(
            &app,
            Method::POST,
            "/api/cart/items",
            Some(TOKEN),
            Some(json!({"productId": 1, "quantity": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(item["productId"], 1);
        assert_eq!(item["quantity"], 2);
        assert_eq!(item["product"]["price"], "4.00");

        let (status, item) = call(
            &app,
            Method::PATCH,
            "/api/cart/items/1",
            Some(TOKEN),
            Some(json!({"quantity": 5})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(item["quantity"], 5);

        let (status, _) = call(&app, Method::DELETE, "/api/cart/items/1", Some(TOKEN), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = call(&app, Method::DELETE, "/api/cart/items/1", Some(TOKEN), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, cart) = call(&app, Method::GET, "/api/cart", Some(TOKEN), None).await;
        assert_eq!(cart["items"], json!([]));
    }

    #[tokio::test]
    async fn test_rejects_bad_input() {
        let app = test_app();

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/cart/items",
            Some(TOKEN),
            Some(json!({"productId": 1, "quantity": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/cart/items",
            Some(TOKEN),
            Some(json!({"productId": 999, "quantity": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(
            &app,
            Method::PATCH,
            "/api/cart/items/2",
            Some(TOKEN),
            Some(json!({"quantity": 3})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_carts_are_per_user() {
        let app = test_app();

        call(
            &app,
            Method::POST,
            "/api/cart/items",
            Some(TOKEN),
            Some(json!({"productId": 2, "quantity": 1})),
        )
        .await;

        let (_, cart) = call(&app, Method::GET, "/api/cart", Some(OTHER_TOKEN), None).await;
        assert_eq!(cart["items"], json!([]));

        let (status, _) = call(&app, Method::DELETE, "/api/cart", Some(TOKEN), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, cart) = call(&app, Method::GET, "/api/cart", Some(TOKEN), None).await;
        assert_eq!(cart["items"], json!([]));
    }

    #[tokio::test]
    async fn test_merge_sums_and_uses_catalog_data() {
        let app = test_app();

        call(
            &app,
            Method::POST,
            "/api/cart/items",
            Some(TOKEN),
            Some(json!({"productId": 1, "quantity": 1})),
        )
        .await;

        let guest_items = json!({"items": [
            {"id": "local-1700000000000", "productId": 1, "quantity": 3,
             "product": {"id": 1, "name": "Stale name", "price": "0.01"}},
            {"id": "local-1700000000001", "productId": 3, "quantity": 1,
             "product": {"id": 3, "name": "Papaya", "price": "3.25"}}
        ]});
        let (status, cart) = call(
            &app,
            Method::POST,
            "/api/cart/merge",
            Some(TOKEN),
            Some(guest_items),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let items = cart["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        let pineapple = items.iter().find(|i| i["productId"] == 1).unwrap();
        assert_eq!(pineapple["quantity"], 4);
        assert_eq!(pineapple["product"]["name"], "Pineapple");
    }

    #[tokio::test]
    async fn test_merge_with_unknown_product_applies_nothing() {
        let app = test_app();

        let guest_items = json!({"items": [
            {"id": "local-1", "productId": 2, "quantity": 1,
             "product": {"id": 2, "name": "Mango", "price": "2.50"}},
            {"id": "local-2", "productId": 404, "quantity": 1,
             "product": {"id": 404, "name": "Gone", "price": "1.00"}}
        ]});
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/cart/merge",
            Some(TOKEN),
            Some(guest_items),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, cart) = call(&app, Method::GET, "/api/cart", Some(TOKEN), None).await;
        assert_eq!(cart["items"], json!([]));
    }

    #[tokio::test]
    async fn test_products_are_public() {
        let app = test_app();

        let (status, product) = call(&app, Method::GET, "/api/products/5", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(product["name"], "Dragon Fruit");
        assert_eq!(product["stock"], 15);

        let (status, _) = call(&app, Method::GET, "/api/products/77", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
