//! Durable key-value storage used to persist the session token.
//!
//! Backends implement `KeyValueStore`, which exposes the batch
//! get/set/remove primitives the token store relies on:
//! - `FileStore`: JSON file in the data directory, replaced atomically
//! - `KeyringStore`: single OS keychain entry holding all keys
//! - `MemoryStore`: in-process map, for tests and ephemeral sessions

pub mod file;
#[cfg(test)]
pub(crate) mod flaky;
pub mod keychain;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use self::file::FileStore;
pub use self::keychain::KeyringStore;
pub use self::memory::MemoryStore;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read from storage: {0}")]
    Read(String),

    #[error("Failed to write to storage: {0}")]
    Write(String),
}

impl StorageError {
    pub fn is_write(&self) -> bool {
        matches!(self, StorageError::Write(_))
    }
}

/// Batch key-value storage.
///
/// `set_many` and `remove_many` apply to all given keys or to none of them.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read several keys at once. The result has one slot per requested key.
    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError>;

    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError>;

    /// Remove several keys. Missing keys are not an error.
    async fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError>;
}
