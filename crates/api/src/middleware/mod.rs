//! Request extractors for the cart API.

pub mod auth;

pub use auth::RequireAuth;
