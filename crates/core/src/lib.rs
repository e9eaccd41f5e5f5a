//! Storefront Cart Core - Shared types library.
//!
//! This crate provides the types shared by every storefront cart component:
//! - `storefront` - Cart reconciliation between the guest cart and the remote cart
//! - `api` - Reference remote cart API
//! - `cli` - Command-line cart client
//!
//! # Architecture
//!
//! The core crate contains only types and pure arithmetic - no I/O, no HTTP
//! clients, no storage. This keeps it lightweight and allows it to be used
//! on both sides of the wire.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, quantities, product snapshots, carts, and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
