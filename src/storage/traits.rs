//! Storage trait definitions

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Date parsing error: {0}")]
    DateParse(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistent JSON key/value storage (the "local storage" role).
///
/// Implementations must be thread-safe (Send + Sync).
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `None` when the key was never written.
    fn get(&self, key: &str) -> StorageResult<Option<Value>>;

    /// Insert or overwrite a value.
    fn set(&self, key: &str, value: &Value) -> StorageResult<()>;

    /// Delete a key. Returns whether it existed.
    fn remove(&self, key: &str) -> StorageResult<bool>;
}

/// Expiring string cookies.
pub trait CookieStore: Send + Sync {
    /// Read a cookie that has not yet expired as of `now`.
    fn get_cookie(&self, name: &str, now: DateTime<Utc>) -> StorageResult<Option<String>>;

    /// Write a cookie valid until `expires_at`.
    ///
    /// A cookie whose expiry is at or before the read time is invisible, so
    /// writing one with a past expiry deletes it.
    fn set_cookie(&self, name: &str, value: &str, expires_at: DateTime<Utc>) -> StorageResult<()>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: KeyValueStore + CookieStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
