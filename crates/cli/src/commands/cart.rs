//! Cart commands and their terminal output.

use rust_decimal::Decimal;
use storefront_cart::gateway::CartGateway;
use storefront_cart::local::GuestStorage;
use storefront_cart::{CartEvent, CartMutation, CartReconciler, CartSummary, MergeOutcome};
use storefront_cart_core::{CartOwnership, CurrencyCode, Price, ProductId};

use super::CliError;

/// A cart operation to run after the session has been observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    Show,
    Add { product_id: ProductId, quantity: i64 },
    Update { product_id: ProductId, quantity: i64 },
    Remove { product_id: ProductId },
    Clear,
    Merge,
}

/// Run `action` against the active cart.
///
/// Returns a line to print, if the action has something to say beyond the
/// cart summary.
///
/// # Errors
///
/// Returns `CliError::Cart` if the cart rejects the operation.
pub async fn execute<S, G>(
    cart: &CartReconciler<S, G>,
    action: CartAction,
) -> Result<Option<String>, CliError>
where
    S: GuestStorage,
    G: CartGateway,
{
    match action {
        CartAction::Show => Ok(None),
        CartAction::Add {
            product_id,
            quantity,
        } => {
            let item = cart.add_product(product_id, quantity).await?;
            Ok(Some(format!(
                "Added {} (now x{})",
                item.product.name,
                item.quantity.get()
            )))
        }
        CartAction::Update {
            product_id,
            quantity,
        } => {
            cart.update_cart_item(product_id, quantity).await?;
            Ok(None)
        }
        CartAction::Remove { product_id } => {
            cart.remove_from_cart(product_id).await?;
            Ok(None)
        }
        CartAction::Clear => {
            cart.clear_cart().await?;
            Ok(None)
        }
        CartAction::Merge => Ok(describe_outcome(&cart.retry_merge().await?)),
    }
}

fn usd(amount: Decimal) -> String {
    Price::new(amount, CurrencyCode::USD).display()
}

/// Render the cart read model for the terminal.
#[must_use]
pub fn render(summary: &CartSummary) -> String {
    let owner = match summary.ownership {
        CartOwnership::Local => "Guest cart",
        CartOwnership::Remote => "Account cart",
    };

    let mut lines = vec![owner.to_string()];
    if summary.items.is_empty() {
        lines.push("  (empty)".to_string());
    }
    for item in &summary.items {
        lines.push(format!(
            "  #{:<5} {:<24} x{:<4} {:>10}",
            item.product_id.to_string(),
            item.product.name,
            item.quantity.get(),
            usd(item.line_total())
        ));
    }
    lines.push(format!(
        "{} item(s), total {}",
        summary.total_items,
        usd(summary.total_price)
    ));
    if summary.is_loading {
        lines.push("Merging guest cart...".to_string());
    }

    lines.join("\n")
}

/// Describe a merge outcome, or `None` if there is nothing worth saying.
#[must_use]
pub fn describe_outcome(outcome: &MergeOutcome) -> Option<String> {
    match outcome {
        MergeOutcome::Skipped | MergeOutcome::NothingToMerge => None,
        MergeOutcome::Merged { lines } => {
            Some(format!("Merged {lines} guest cart line(s) into your account"))
        }
        MergeOutcome::InFlight => Some("A cart merge is already in progress".to_string()),
        MergeOutcome::Failed { message } => Some(format!(
            "Could not merge your guest cart: {message}. Run `cart-cli merge` to retry."
        )),
    }
}

/// Describe a cart notification, or `None` for routine updates.
///
/// Merge results are covered by [`describe_outcome`].
#[must_use]
pub fn describe_event(event: &CartEvent) -> Option<String> {
    match event {
        CartEvent::Failed { mutation, message } if *mutation != CartMutation::Merge => {
            Some(format!("! {} failed: {message}", mutation.as_str()))
        }
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storefront_cart_core::{Cart, CartItem, CartItemId, ProductSnapshot, Quantity};

    use super::*;

    #[test]
    fn test_render_guest_cart() {
        let cart = Cart::local(vec![CartItem {
            id: CartItemId::local(1_700_000_000_000),
            product_id: ProductId::new(1),
            quantity: Quantity::new(3).unwrap(),
            product: ProductSnapshot::new(ProductId::new(1), "Pineapple", Decimal::new(400, 2)),
        }]);

        let output = render(&CartSummary::from(cart));
        assert!(output.starts_with("Guest cart"));
        assert!(output.contains("Pineapple"));
        assert!(output.contains("x3"));
        assert!(output.contains("$12.00"));
        assert!(output.ends_with("3 item(s), total $12.00"));
    }

    #[test]
    fn test_render_empty_account_cart() {
        let output = render(&CartSummary::from(Cart::empty_remote()));
        assert!(output.starts_with("Account cart"));
        assert!(output.contains("(empty)"));
        assert!(output.contains("0 item(s), total $0.00"));
    }

    #[test]
    fn test_describe_outcome() {
        assert_eq!(describe_outcome(&MergeOutcome::Skipped), None);
        assert_eq!(
            describe_outcome(&MergeOutcome::Merged { lines: 2 }).unwrap(),
            "Merged 2 guest cart line(s) into your account"
        );
        assert!(
            describe_outcome(&MergeOutcome::Failed {
                message: "Could not reach the cart service".to_string()
            })
            .unwrap()
            .contains("cart-cli merge")
        );
    }

    #[test]
    fn test_describe_event_only_reports_failures() {
        assert_eq!(
            describe_event(&CartEvent::Updated {
                ownership: CartOwnership::Local
            }),
            None
        );
        assert_eq!(
            describe_event(&CartEvent::Failed {
                mutation: CartMutation::Add,
                message: "Product not found".to_string()
            })
            .unwrap(),
            "! add failed: Product not found"
        );
        assert_eq!(
            describe_event(&CartEvent::Failed {
                mutation: CartMutation::Merge,
                message: "Could not reach the cart service".to_string()
            }),
            None
        );
    }
}
