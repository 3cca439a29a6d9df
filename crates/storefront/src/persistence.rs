//! Cart persistence bridge.
//!
//! The full cart is serialized to JSON and written under one fixed key after
//! every successful mutation, and read back once at startup.

use std::sync::Arc;

use rocketshoes_core::Cart;
use thiserror::Error;

use crate::store::{DurableStore, StoreError};

/// Key the cart is stored under unless configured otherwise.
pub const DEFAULT_CART_KEY: &str = "@RocketShoes:cart";

/// Errors loading or saving the cart.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The storage backend failed.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// The stored text is not a valid cart.
    #[error("Malformed cart under key {key}: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The cart could not be serialized.
    #[error("Failed to serialize cart: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// A durable store bound to the cart's key.
#[derive(Clone)]
pub struct CartStorage {
    store: Arc<dyn DurableStore>,
    key: String,
}

impl CartStorage {
    pub fn new(store: Arc<dyn DurableStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Read the stored cart. A missing entry is an empty cart.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Malformed`] if the stored text does not
    /// decode into a cart that satisfies its invariants, or
    /// [`PersistenceError::Store`] if the backend fails.
    pub async fn load(&self) -> Result<Cart, PersistenceError> {
        let Some(text) = self.store.get(&self.key).await? else {
            return Ok(Cart::new());
        };

        serde_json::from_str(&text).map_err(|source| PersistenceError::Malformed {
            key: self.key.clone(),
            source,
        })
    }

    /// Replace the stored cart with `cart`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend write fails.
    pub async fn save(&self, cart: &Cart) -> Result<(), PersistenceError> {
        let text = serde_json::to_string(cart).map_err(PersistenceError::Serialize)?;
        self.store.set(&self.key, &text).await?;
        Ok(())
    }
}
