//! `SecureStore` trait — the single async interface for local persistence.
//!
//! Values are strings addressed by exact key name. A missing key is `None`,
//! never an error. Each call is an atomic single-key operation; nothing
//! here offers multi-key transactions.

use async_trait::async_trait;

use crate::error::StorageError;

/// Backend-agnostic secure key-value store.
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Read a value. `Ok(None)` when the key is unset.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write (overwrite) a value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Deleting an unset key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}
