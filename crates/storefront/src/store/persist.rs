//! Persistence adapter for the cart state.
//!
//! The state is stored as a versioned JSON envelope:
//!
//! ```json
//! {"state": {"items": [...], "isOpen": false}, "version": 0}
//! ```

use basket_core::CartState;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::{SharedStorage, StorageError};

/// Storage key for the serialized cart state.
pub const CART_KEY: &str = "shopping-cart";

/// Version of the persisted envelope.
pub const STORAGE_VERSION: u32 = 0;

/// Errors from saving or loading the cart state.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported cart record version {found} (expected {STORAGE_VERSION})")]
    Version { found: u32 },
}

#[derive(Serialize, Deserialize)]
struct Envelope<S> {
    state: S,
    version: u32,
}

/// Serializes the full cart state into storage and reads it back.
#[derive(Clone)]
pub struct CartPersistence {
    storage: SharedStorage,
}

impl CartPersistence {
    #[must_use]
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    /// Write `state` under [`CART_KEY`].
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the storage write fails.
    pub fn save(&self, state: &CartState) -> Result<(), PersistError> {
        let record = serde_json::to_string(&Envelope {
            state,
            version: STORAGE_VERSION,
        })?;
        self.storage.set_item(CART_KEY, &record)?;
        Ok(())
    }

    /// Read the state under [`CART_KEY`], if one was saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails, the record does not parse,
    /// or it was written by an incompatible version.
    pub fn load(&self) -> Result<Option<CartState>, PersistError> {
        let Some(record) = self.storage.get_item(CART_KEY)? else {
            return Ok(None);
        };
        let envelope: Envelope<CartState> = serde_json::from_str(&record)?;
        if envelope.version != STORAGE_VERSION {
            return Err(PersistError::Version {
                found: envelope.version,
            });
        }
        Ok(Some(envelope.state))
    }
}
