//! Passgate core
//!
//! System boundaries for the password session layer: time, randomness and
//! durable key/value storage, plus the typed store for the two persisted
//! session fields.
//!
//! # Components
//!
//! - [`Environment`]: wall clock and randomness, swappable for simulation
//! - [`SystemEnv`]: production environment (system clock, OS RNG)
//! - [`KeyValueStore`]: synchronous string storage collaborator
//! - [`MemoryStore`] / [`RedbStore`]: in-memory and durable stores
//! - [`SessionConfig`]: freshness window and KDF cost
//! - [`SessionStore`]: typed load/save/clear of the persisted fingerprint and
//!   last-checked timestamp
//!
//! `SessionStore` is the only code that reads or writes session data in
//! storage.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod env;
pub mod persisted;
pub mod storage;
mod system_env;
mod time;

pub use config::{DEFAULT_FRESHNESS_WINDOW, SessionConfig};
pub use env::Environment;
pub use passgate_crypto::PasswordHash;
pub use persisted::{LAST_CHECKED_KEY, PASSWORD_KEY, PersistedSession, SessionStore};
pub use storage::{KeyValueStore, MemoryStore, RedbStore, StorageError};
pub use system_env::SystemEnv;
pub use time::Timestamp;
