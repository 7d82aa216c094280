//! Passphrase key derivation using PBKDF2-HMAC-SHA256

use sha2::Sha256;
use zeroize::Zeroize;

use crate::CryptoError;

/// Size of the per-message random salt (16 bytes)
pub const SALT_SIZE: usize = 16;

/// Rounds used for newly sealed messages unless configured otherwise.
pub const DEFAULT_KDF_ROUNDS: u32 = 600_000;

/// Lowest round count accepted when sealing or opening.
pub const MIN_KDF_ROUNDS: u32 = 1_000;

/// Highest round count accepted when opening a message.
///
/// Bounds the work an attacker-supplied header can force on us.
pub const MAX_KDF_ROUNDS: u32 = 10_000_000;

/// A 32-byte key derived from a passphrase.
///
/// Used for a single seal or open and then dropped.
pub(crate) struct DerivedKey {
    key: [u8; 32],
}

impl DerivedKey {
    /// 32-byte symmetric key for XChaCha20-Poly1305 AEAD.
    pub(crate) fn key(&self) -> &[u8; 32] {
        &self.key
    }
}

// Implement Drop to zeroize key material
impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// Check that a round count is within [`MIN_KDF_ROUNDS`]..=[`MAX_KDF_ROUNDS`].
pub fn validate_rounds(rounds: u32) -> Result<u32, CryptoError> {
    if (MIN_KDF_ROUNDS..=MAX_KDF_ROUNDS).contains(&rounds) {
        Ok(rounds)
    } else {
        Err(CryptoError::InvalidKdfRounds(rounds))
    }
}

/// Derive a message key from a passphrase and salt.
///
/// Deterministic: the same (passphrase, salt, rounds) always produce the
/// same key. Callers validate `rounds` first.
pub(crate) fn derive_key(passphrase: &str, salt: &[u8; SALT_SIZE], rounds: u32) -> DerivedKey {
    let mut key = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, rounds, &mut key);
    DerivedKey { key }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_is_deterministic() {
        let salt = [7u8; SALT_SIZE];
        let k1 = derive_key("passphrase", &salt, MIN_KDF_ROUNDS);
        let k2 = derive_key("passphrase", &salt, MIN_KDF_ROUNDS);
        assert_eq!(k1.key(), k2.key(), "same inputs must produce same output");
    }

    #[test]
    fn different_salts_produce_different_keys() {
        let k1 = derive_key("passphrase", &[0u8; SALT_SIZE], MIN_KDF_ROUNDS);
        let k2 = derive_key("passphrase", &[1u8; SALT_SIZE], MIN_KDF_ROUNDS);
        assert_ne!(k1.key(), k2.key());
    }

    #[test]
    fn different_rounds_produce_different_keys() {
        let salt = [0u8; SALT_SIZE];
        let k1 = derive_key("passphrase", &salt, MIN_KDF_ROUNDS);
        let k2 = derive_key("passphrase", &salt, MIN_KDF_ROUNDS + 1);
        assert_ne!(k1.key(), k2.key());
    }

    #[test]
    fn rounds_bounds() {
        assert!(validate_rounds(MIN_KDF_ROUNDS).is_ok());
        assert!(validate_rounds(DEFAULT_KDF_ROUNDS).is_ok());
        assert!(validate_rounds(MAX_KDF_ROUNDS).is_ok());
        assert_eq!(validate_rounds(0), Err(CryptoError::InvalidKdfRounds(0)));
        assert_eq!(
            validate_rounds(MAX_KDF_ROUNDS + 1),
            Err(CryptoError::InvalidKdfRounds(MAX_KDF_ROUNDS + 1))
        );
    }
}
