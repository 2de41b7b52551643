//! Session storage
//!
//! Surfaces talk to [`StorageAdapter`], which never fails. Underneath, any
//! backend implementing `KeyValueStore` + `CookieStore` can be plugged in; the
//! persistent one is `SqliteStore`.

mod adapter;
mod memory;
mod sqlite;
mod traits;

pub use adapter::{StorageAdapter, STORAGE_RESTRICTED_TITLE};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{CookieStore, KeyValueStore, OpenStore, StorageError, StorageResult};
