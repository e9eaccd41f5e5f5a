//! Guest-to-account merge state machine.
//!
//! ```text
//! Anonymous --login--> MergePending --merge ok / empty guest cart--> Merged
//!     ^                    |  ^                                       |
//!     |                    +--+ merge failed (guest cart kept)        |
//!     +--------------------------- logout ----------------------------+
//! ```
//!
//! `Merged` is terminal for a login session. A different user logging in
//! starts a new session in `MergePending`.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

/// Where the session is in the merge lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeState {
    /// No user; the guest cart is the active cart.
    #[default]
    Anonymous,
    /// A user is logged in and the guest cart has not been merged yet.
    MergePending,
    /// The guest cart was merged (or was empty) for this login session.
    Merged,
}

/// Result of observing the session or retrying the merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MergeOutcome {
    /// Nothing to do: anonymous, or already merged this session.
    Skipped,
    /// The guest cart was empty; no request was sent.
    NothingToMerge,
    /// The guest cart was submitted and cleared.
    Merged { lines: usize },
    /// Another merge request is still outstanding.
    InFlight,
    /// The merge request failed; the guest cart is kept for a retry.
    Failed { message: String },
}

/// Guard that lets at most one merge request be outstanding.
#[derive(Debug, Default)]
pub(crate) struct SingleFlight {
    active: AtomicBool,
}

impl SingleFlight {
    /// Take the flight, or `None` if it is already taken.
    pub(crate) fn try_acquire(&self) -> Option<FlightGuard<'_>> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard {
                active: &self.active,
            })
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Releases the flight when dropped.
#[derive(Debug)]
pub(crate) struct FlightGuard<'a> {
    active: &'a AtomicBool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_flight_excludes_second_acquire() {
        let flight = SingleFlight::default();

        let guard = flight.try_acquire();
        assert!(guard.is_some());
        assert!(flight.is_active());
        assert!(flight.try_acquire().is_none());

        drop(guard);
        assert!(!flight.is_active());
        assert!(flight.try_acquire().is_some());
    }

    #[test]
    fn test_default_state_is_anonymous() {
        assert_eq!(MergeState::default(), MergeState::Anonymous);
    }
}
