//! Login session persisted between invocations.
//!
//! Stored next to the guest cart in the data directory under
//! [`SESSION_KEY`]. A session that cannot be parsed is treated as logged out.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use storefront_cart::local::{GuestStorage, StorageError};
use storefront_cart_core::UserId;

/// Storage key for the session record.
pub const SESSION_KEY: &str = "session";

#[derive(Serialize, Deserialize)]
struct StoredSession {
    user: UserId,
    token: String,
}

/// The logged-in user and their bearer token.
pub struct Session {
    pub user: UserId,
    pub token: SecretString,
}

impl Session {
    #[must_use]
    pub fn new(user: UserId, token: impl Into<String>) -> Self {
        Self {
            user,
            token: SecretString::from(token.into()),
        }
    }

    /// Load the stored session, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the storage backend cannot be read.
    pub fn load(storage: &impl GuestStorage) -> Result<Option<Self>, StorageError> {
        let Some(raw) = storage.get(SESSION_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str::<StoredSession>(&raw) {
            Ok(stored) => Ok(Some(Self::new(stored.user, stored.token))),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable session record");
                Ok(None)
            }
        }
    }

    /// Persist this session, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the storage backend cannot be written.
    pub fn save(&self, storage: &mut impl GuestStorage) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&StoredSession {
            user: self.user,
            token: self.token.expose_secret().to_string(),
        })?;
        storage.set(SESSION_KEY, &raw)
    }

    /// Forget the stored session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the storage backend cannot be written.
    pub fn clear(storage: &mut impl GuestStorage) -> Result<(), StorageError> {
        storage.remove(SESSION_KEY)
    }
}
