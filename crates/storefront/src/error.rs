//! Unified error handling with Sentry integration.
//!
//! Cart operations return `Result<T, CartError>`. Failures are reported to
//! Sentry and the log before being surfaced to the caller; when no Sentry
//! client is initialized the reporting calls are no-ops.

use thiserror::Error;

use crate::events::CartMutation;
use crate::gateway::GatewayError;
use crate::local::StorageError;

/// Error type for cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Remote cart API operation failed.
    #[error("Cart API error: {0}")]
    Gateway(#[from] GatewayError),

    /// Guest cart storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The operation needs an authenticated session.
    #[error("Not authenticated")]
    NotAuthenticated,
}

impl CartError {
    /// Short message suitable for showing to the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Gateway(GatewayError::Unauthorized) | Self::NotAuthenticated => {
                "Please sign in again".to_string()
            }
            Self::Gateway(GatewayError::NotFound(detail)) => format!("Not found: {detail}"),
            Self::Gateway(GatewayError::RateLimited(secs)) => {
                format!("Too many requests, try again in {secs}s")
            }
            Self::Gateway(_) => "Could not reach the cart service".to_string(),
            Self::Storage(_) => "Could not save your cart on this device".to_string(),
        }
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;

/// Log a failed cart operation and capture it to Sentry.
///
/// Client-side conditions (`NotAuthenticated`, 401, 404) are logged at
/// `warn` and not captured.
pub fn report(mutation: CartMutation, error: &CartError) {
    let operation = mutation.as_str();
    add_breadcrumb("cart", &format!("{operation} failed"), Some(&[("operation", operation)]));

    if matches!(
        error,
        CartError::NotAuthenticated
            | CartError::Gateway(GatewayError::Unauthorized | GatewayError::NotFound(_))
    ) {
        tracing::warn!(operation, error = %error, "Cart operation rejected");
        return;
    }

    let event_id = sentry::capture_error(error);
    tracing::error!(
        operation,
        error = %error,
        sentry_event_id = %event_id,
        "Cart operation failed"
    );
}

/// Set the Sentry user context from a user ID.
///
/// Called when a login session is observed so errors are associated with it.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Called when the session ends.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of cart
/// actions leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_display() {
        let err = CartError::NotAuthenticated;
        assert_eq!(err.to_string(), "Not authenticated");

        let err = CartError::from(GatewayError::Status {
            status: 500,
            body: "boom".to_string(),
        });
        assert_eq!(err.to_string(), "Cart API error: Cart API returned 500: boom");
    }

    #[test]
    fn test_user_messages_hide_details() {
        let err = CartError::from(GatewayError::Status {
            status: 502,
            body: "upstream stack trace".to_string(),
        });
        assert_eq!(err.user_message(), "Could not reach the cart service");

        let err = CartError::from(GatewayError::RateLimited(3));
        assert_eq!(err.user_message(), "Too many requests, try again in 3s");

        let err = CartError::from(StorageError::Io(std::io::Error::other("disk full")));
        assert_eq!(err.user_message(), "Could not save your cart on this device");
    }

    #[test]
    fn test_not_found_message_names_the_missing_thing() {
        let err = CartError::from(GatewayError::NotFound("product 12".to_string()));
        assert_eq!(err.user_message(), "Not found: product 12");

        let err = CartError::from(GatewayError::NotFound(
            "no cart line for product 3".to_string(),
        ));
        assert_eq!(err.user_message(), "Not found: no cart line for product 3");
    }

    #[test]
    fn test_report_without_sentry_client() {
        // No client is bound in tests; reporting must not panic
        report(CartMutation::Merge, &CartError::NotAuthenticated);
        report(
            CartMutation::Add,
            &CartError::from(GatewayError::Status {
                status: 500,
                body: String::new(),
            }),
        );
    }
}
