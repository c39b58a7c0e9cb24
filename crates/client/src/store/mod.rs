//! Durable key-value storage for the client's shadow copies.
//!
//! The store is a single string-keyed, string-valued key space that survives
//! process restarts. Each manager owns disjoint keys (see [`keys`]), so no
//! cross-manager locking is needed. The store only ever holds a serialized
//! copy; the managers' in-memory state stays authoritative.
//!
//! # Implementations
//!
//! - [`MemoryStore`] - In-process map, for tests and ephemeral sessions
//! - [`FileStore`] - One file per key in a state directory

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::sync::Arc;

use thiserror::Error;

/// Keys owned by the state managers.
pub mod keys {
    /// Serialized cart line items (owned by the cart manager).
    pub const CART: &str = "cart";

    /// Opaque bearer token (owned by the session manager).
    pub const TOKEN: &str = "token";
}

/// Errors that can occur when reading or writing the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("I/O error on key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Key contains characters the backend cannot represent.
    #[error("invalid store key: {0:?}")]
    InvalidKey(String),

    /// Backend is not reachable.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A string-valued, durable key-value store.
///
/// Calls are synchronous and complete their write before returning, so a
/// manager's persisted shadow copy is never behind the state it reports.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Shared handle to a store, as held by the managers.
pub type SharedStore = Arc<dyn KeyValueStore>;

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}
