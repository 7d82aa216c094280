//! Storage abstraction for persisted session fields
//!
//! A minimal string key/value interface. The trait is synchronous (no async):
//! the session layer performs a handful of small reads and writes and never
//! holds a storage call across an await point.

mod error;
mod memory;
mod redb;

pub use error::StorageError;
pub use memory::MemoryStore;

pub use self::redb::RedbStore;

/// Durable string key/value storage.
///
/// Must be Clone (shared between the session manager and its background
/// tasks), Send + Sync (thread-safe), and synchronous. Implementations
/// typically share internal state via Arc, so clones access the same
/// underlying storage.
pub trait KeyValueStore: Clone + Send + Sync + 'static {
    /// Value stored under `key`. `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, overwriting any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
