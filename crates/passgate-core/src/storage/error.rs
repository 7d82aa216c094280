//! Storage error types.

use thiserror::Error;

/// Errors from key/value storage and persisted session decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Underlying storage failed (disk, database, injected fault).
    #[error("storage I/O error: {0}")]
    Io(String),

    /// A stored value could not be decoded.
    #[error("corrupted value under {key:?}: {reason}")]
    Corrupted {
        /// Storage key holding the bad value
        key: String,
        /// What was wrong with it
        reason: String,
    },
}

impl StorageError {
    /// Whether retrying the same operation could succeed.
    ///
    /// Corrupted values stay corrupted until something rewrites them.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
