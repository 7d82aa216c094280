//! Passgate Cryptographic Primitives
//!
//! Cryptographic building blocks for the passgate session layer. Pure
//! functions with deterministic outputs. Callers provide random bytes for
//! deterministic testing.
//!
//! # Fingerprints
//!
//! The master password is never stored. What is stored is its fingerprint,
//! the lowercase hex SHA-256 digest of the password's UTF-8 bytes. The digest
//! algorithm and encoding are fixed so fingerprints computed in different
//! sessions compare equal.
//!
//! # Armored Messages
//!
//! Secrets are sealed under a passphrase (the fingerprint hex string) and
//! carried as ASCII armor so they survive copy/paste and text storage.
//!
//! ```text
//! passphrase + random salt
//!        │
//!        ▼
//! PBKDF2-HMAC-SHA256 (rounds stored in header) → 32-byte key
//!        │
//!        ▼
//! XChaCha20-Poly1305 (random nonce, header as AAD) → ciphertext
//!        │
//!        ▼
//! version ‖ rounds ‖ salt ‖ nonce ‖ ciphertext → base64 → armor
//! ```
//!
//! # Security
//!
//! Integrity:
//! - The Poly1305 tag covers the ciphertext and the whole header
//! - A wrong passphrase and a tampered message are indistinguishable
//!
//! Key Material:
//! - Derived keys are zeroized on drop
//! - Fingerprints are compared in constant time
//! - `Debug` output of a fingerprint is redacted

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod armor;
mod error;
mod fingerprint;
mod kdf;
mod message;

pub use armor::{ARMOR_FOOTER, ARMOR_HEADER, decode_armor, encode_armor};
pub use error::CryptoError;
pub use fingerprint::{PasswordHash, hash_password, verify_password};
pub use kdf::{DEFAULT_KDF_ROUNDS, MAX_KDF_ROUNDS, MIN_KDF_ROUNDS, SALT_SIZE, validate_rounds};
pub use message::{
    MESSAGE_VERSION, NONCE_SIZE, SealedMessage, decrypt_armored, encrypt_armored,
};
