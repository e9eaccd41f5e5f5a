//! Mutation status flags and user-facing cart notifications.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use storefront_cart_core::CartOwnership;

/// Cart operations whose progress is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CartMutation {
    Add,
    Remove,
    Update,
    Clear,
    Merge,
}

impl CartMutation {
    /// Stable name used in logs and breadcrumbs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Update => "update",
            Self::Clear => "clear",
            Self::Merge => "merge",
        }
    }
}

/// Pending and error state of one kind of mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MutationStatus {
    /// A mutation of this kind is in progress.
    pub pending: bool,
    /// Message of the most recent failure, cleared by the next success.
    pub last_error: Option<String>,
}

/// Notification broadcast to cart subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CartEvent {
    /// The active cart changed.
    Updated { ownership: CartOwnership },
    /// The guest cart was merged into the account cart.
    Merged { lines: usize },
    /// A mutation failed; `message` is safe to show to the shopper.
    Failed {
        mutation: CartMutation,
        message: String,
    },
}

/// Per-mutation status flags.
#[derive(Debug, Default)]
pub(crate) struct MutationTracker {
    statuses: Mutex<HashMap<CartMutation, MutationStatus>>,
}

impl MutationTracker {
    pub(crate) fn begin(&self, mutation: CartMutation) {
        self.with(mutation, |status| status.pending = true);
    }

    pub(crate) fn succeed(&self, mutation: CartMutation) {
        self.with(mutation, |status| {
            status.pending = false;
            status.last_error = None;
        });
    }

    pub(crate) fn fail(&self, mutation: CartMutation, message: String) {
        self.with(mutation, |status| {
            status.pending = false;
            status.last_error = Some(message);
        });
    }

    pub(crate) fn status(&self, mutation: CartMutation) -> MutationStatus {
        self.statuses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&mutation)
            .cloned()
            .unwrap_or_default()
    }

    fn with(&self, mutation: CartMutation, f: impl FnOnce(&mut MutationStatus)) {
        let mut statuses = self.statuses.lock().unwrap_or_else(PoisonError::into_inner);
        f(statuses.entry(mutation).or_default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_lifecycle() {
        let tracker = MutationTracker::default();
        assert_eq!(tracker.status(CartMutation::Add), MutationStatus::default());

        tracker.begin(CartMutation::Add);
        assert!(tracker.status(CartMutation::Add).pending);
        assert!(!tracker.status(CartMutation::Clear).pending);

        tracker.fail(CartMutation::Add, "offline".to_string());
        let status = tracker.status(CartMutation::Add);
        assert!(!status.pending);
        assert_eq!(status.last_error.as_deref(), Some("offline"));

        tracker.begin(CartMutation::Add);
        tracker.succeed(CartMutation::Add);
        assert_eq!(tracker.status(CartMutation::Add), MutationStatus::default());
    }

    #[test]
    fn test_event_serialization() {
        let event = CartEvent::Failed {
            mutation: CartMutation::Merge,
            message: "Could not reach the cart service".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap_or_default();
        assert_eq!(json["type"], "failed");
        assert_eq!(json["mutation"], "merge");
    }
}
