//! Storefront Cart library.
//!
//! Keeps the shopper's cart consistent across the anonymous-to-authenticated
//! transition:
//!
//! - While anonymous, the cart lives in local storage ([`local`])
//! - Once authenticated, the remote cart API is the source of truth ([`gateway`])
//! - On login the guest cart is merged into the account cart exactly once ([`merge`])
//!
//! [`reconciler::CartReconciler`] ties these together behind one read model
//! and one set of mutation functions.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod local;
pub mod merge;
pub mod reconciler;
pub mod state;

pub use error::{CartError, Result};
pub use events::{CartEvent, CartMutation, MutationStatus};
pub use merge::{MergeOutcome, MergeState};
pub use reconciler::{CartReconciler, CartSource, CartSummary};
pub use state::{CartState, StorefrontCart};
