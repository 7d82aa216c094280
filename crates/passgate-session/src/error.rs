//! Session error types

use passgate_core::StorageError;
use passgate_crypto::CryptoError;
use thiserror::Error;

/// Errors from a [`crate::SecretCipher`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// Sealing the plaintext failed.
    #[error("encryption failed: {0}")]
    Encryption(CryptoError),

    /// Opening the message failed (malformed armor, wrong passphrase,
    /// tampering).
    #[error("decryption failed: {0}")]
    Decryption(CryptoError),

    /// The message opened but its plaintext is not UTF-8.
    #[error("decrypted plaintext is not valid UTF-8")]
    NotUtf8,

    /// The blocking worker running the cipher panicked or was cancelled.
    #[error("cipher worker failed: {0}")]
    Worker(String),
}

/// Errors surfaced by [`crate::SessionManager`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The submitted password does not match the stored fingerprint.
    #[error("password does not match the stored fingerprint")]
    PasswordMismatch,

    /// The user dismissed the password prompt.
    #[error("password entry was cancelled")]
    Cancelled,

    /// The session manager was torn down.
    #[error("session manager has shut down")]
    ShutDown,

    /// The secret cipher failed.
    #[error(transparent)]
    Cipher(#[from] CipherError),

    /// Persisted session storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// Whether the user can fix this by entering the password again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PasswordMismatch | Self::Cancelled)
    }
}
