//! Durable key/value storage backing the session.
//!
//! Reads and writes are synchronous and local, like browser local storage.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

/// Key holding the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Key holding the serialized user record.
pub const USER_KEY: &str = "user";

/// Failures of a [`KeyValueStorage`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The backing file does not hold a JSON string map.
    #[error("storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    /// A writer panicked while holding the lock.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// String key/value store surviving process restarts (for persistent
/// implementations).
pub trait KeyValueStorage: Send + Sync + std::fmt::Debug {
    /// Value stored under `key`, if any.
    ///
    /// # Errors
    /// Returns a [`StorageError`] when the backing store cannot be read.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns a [`StorageError`] when the value cannot be written.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Forgets `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    /// Returns a [`StorageError`] when the change cannot be written.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Whether values outlive the process.
    fn is_persistent(&self) -> bool;
}
