//! Durable key-value storage for client-side state.
//!
//! The cart survives restarts by living under a fixed key in a
//! [`DurableStore`]. Two backends are provided:
//!
//! - [`FileStore`] - a single JSON document on disk (the CLI default)
//! - [`MemoryStore`] - process-local, for tests and throwaway sessions

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing document is not a key-value map.
    #[error("Corrupt store document {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The key-value map could not be encoded.
    #[error("Failed to encode store document: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Text storage keyed by string, surviving process restarts.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Durably replace the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}
