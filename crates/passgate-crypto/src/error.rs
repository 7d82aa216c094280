//! Error types for passgate cryptographic operations.

use thiserror::Error;

/// Errors from fingerprint parsing, armor decoding and message sealing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Armor framing or base64 body is invalid
    #[error("malformed armor: {reason}")]
    MalformedArmor {
        /// What was wrong with the armor
        reason: String,
    },

    /// Message was produced by an unknown format version
    #[error("unsupported message version: {0}")]
    UnsupportedVersion(u8),

    /// KDF round count outside the accepted range
    #[error("invalid KDF rounds: {0}")]
    InvalidKdfRounds(u32),

    /// Authentication tag did not verify (wrong passphrase or tampering)
    #[error("decryption failed: authentication tag mismatch")]
    DecryptionFailed,

    /// Stored fingerprint is not a 64-character hex digest
    #[error("invalid fingerprint: {reason}")]
    InvalidFingerprint {
        /// What was wrong with the fingerprint
        reason: String,
    },
}

impl CryptoError {
    /// Returns true if the input itself is malformed, as opposed to a
    /// well-formed message sealed under a different passphrase.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Self::MalformedArmor { .. } | Self::UnsupportedVersion(_) | Self::InvalidKdfRounds(_)
        )
    }
}
