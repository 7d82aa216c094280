//! Password fingerprints.
//!
//! A fingerprint is the lowercase hex SHA-256 digest of the raw password. It
//! is the only form of the password that is ever persisted, and it doubles as
//! the passphrase for sealing secrets.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::CryptoError;

/// Hex-encoded SHA-256 digest of a master password.
///
/// # Invariants
///
/// - Exactly [`PasswordHash::HEX_LEN`] lowercase hex characters
/// - Never constructed from anything but a digest (no raw passwords)
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Length of the hex encoding (32 digest bytes).
    pub const HEX_LEN: usize = 64;

    /// Parse a stored fingerprint.
    ///
    /// Uppercase hex is accepted and normalized to lowercase.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        if hex.len() != Self::HEX_LEN {
            return Err(CryptoError::InvalidFingerprint {
                reason: format!("expected {} hex characters, got {}", Self::HEX_LEN, hex.len()),
            });
        }

        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CryptoError::InvalidFingerprint {
                reason: "non-hex character".to_string(),
            });
        }

        Ok(Self(hex.to_ascii_lowercase()))
    }

    /// Hex string, also used as the sealing passphrase.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = self.0.get(..8).unwrap_or_default();
        write!(f, "PasswordHash({prefix}…)")
    }
}

/// Fingerprint a raw password.
///
/// Pure and deterministic: the same password always yields the same hash.
pub fn hash_password(raw: &str) -> PasswordHash {
    let digest = Sha256::digest(raw.as_bytes());
    PasswordHash(hex::encode(digest))
}

/// Check a raw password against the stored fingerprint.
///
/// An absent fingerprint always verifies: the first password entered
/// establishes it.
pub fn verify_password(raw: &str, stored: Option<&PasswordHash>) -> bool {
    match stored {
        None => true,
        Some(stored) => {
            let candidate = hash_password(raw);
            constant_time_eq(candidate.as_str().as_bytes(), stored.as_str().as_bytes())
        },
    }
}

/// Constant-time byte comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn known_digest() {
        // sha256("password")
        let hash = hash_password("password");
        assert_eq!(
            hash.as_str(),
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
        );
    }

    #[test]
    fn empty_password_has_a_fingerprint() {
        let hash = hash_password("");
        assert_eq!(hash.as_str().len(), PasswordHash::HEX_LEN);
    }

    #[test]
    fn absent_fingerprint_always_verifies() {
        assert!(verify_password("anything", None));
        assert!(verify_password("", None));
    }

    #[test]
    fn matching_password_verifies() {
        let stored = hash_password("correct horse");
        assert!(verify_password("correct horse", Some(&stored)));
        assert!(!verify_password("battery staple", Some(&stored)));
    }

    #[test]
    fn from_hex_normalizes_case() {
        let upper = "5E884898DA28047151D0E56F8DC6292773603D0D6AABBDD62A11EF721D1542D8";
        let hash = PasswordHash::from_hex(upper).unwrap();
        assert_eq!(hash, hash_password("password"));
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert!(matches!(
            PasswordHash::from_hex("abc"),
            Err(CryptoError::InvalidFingerprint { .. })
        ));
        let not_hex = "z".repeat(PasswordHash::HEX_LEN);
        assert!(matches!(
            PasswordHash::from_hex(&not_hex),
            Err(CryptoError::InvalidFingerprint { .. })
        ));
    }

    #[test]
    fn debug_is_redacted() {
        let hash = hash_password("password");
        let rendered = format!("{hash:?}");
        assert_eq!(rendered, "PasswordHash(5e884898…)");
        assert!(!rendered.contains(hash.as_str()));
    }

    proptest! {
        #[test]
        fn prop_hash_is_deterministic(raw in ".*") {
            prop_assert_eq!(hash_password(&raw), hash_password(&raw));
        }

        #[test]
        fn prop_hash_roundtrips_through_hex(raw in ".*") {
            let hash = hash_password(&raw);
            prop_assert_eq!(PasswordHash::from_hex(hash.as_str()).unwrap(), hash);
        }

        #[test]
        fn prop_only_the_same_password_verifies(a in "[a-z]{1,16}", b in "[a-z]{1,16}") {
            let stored = hash_password(&a);
            prop_assert_eq!(verify_password(&b, Some(&stored)), a == b);
        }
    }
}
