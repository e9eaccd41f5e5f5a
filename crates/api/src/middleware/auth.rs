//! Bearer-token authentication extractor.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use storefront_cart_core::UserId;

use crate::error::ApiError;
use crate::state::ApiState;

/// Extractor that requires a known bearer token.
///
/// Rejects with `ApiError::Unauthorized` when the `Authorization` header is
/// missing, not a bearer token, or not in the configured token table.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAuth(user): RequireAuth) -> String {
///     format!("Hello, user {user}!")
/// }
/// ```
pub struct RequireAuth(pub UserId);

impl FromRequestParts<ApiState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ApiState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or(ApiError::Unauthorized)?;

        let user = state.user_for_token(token).ok_or_else(|| {
            tracing::warn!(path = %parts.uri.path(), "Rejected unknown bearer token");
            ApiError::Unauthorized
        })?;

        sentry::configure_scope(|scope| {
            scope.set_user(Some(sentry::User {
                id: Some(user.to_string()),
                ..Default::default()
            }));
        });

        Ok(Self(user))
    }
}
