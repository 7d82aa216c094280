//! Passphrase-sealed messages using `XChaCha20-Poly1305`
//!
//! All functions are pure - random bytes must be provided by the caller.

use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit, Payload},
};

use crate::{
    CryptoError, armor,
    kdf::{SALT_SIZE, derive_key, validate_rounds},
};

/// Current binary format version.
pub const MESSAGE_VERSION: u8 = 1;

/// Size of the `XChaCha20` nonce (24 bytes)
pub const NONCE_SIZE: usize = 24;

/// Poly1305 tag size (16 bytes)
const POLY1305_TAG_SIZE: usize = 16;

/// version (1) + rounds (4) + salt + nonce
const HEADER_SIZE: usize = 1 + 4 + SALT_SIZE + NONCE_SIZE;

/// A sealed message in binary form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedMessage {
    /// PBKDF2 rounds used to derive the key
    pub kdf_rounds: u32,
    /// Per-message PBKDF2 salt
    pub salt: [u8; SALT_SIZE],
    /// The 24-byte `XChaCha20` nonce
    pub nonce: [u8; NONCE_SIZE],
    /// The ciphertext including 16-byte Poly1305 tag
    pub ciphertext: Vec<u8>,
}

impl SealedMessage {
    /// Seal a plaintext under a passphrase.
    ///
    /// # Security
    ///
    /// - Caller MUST provide cryptographically secure `salt` and `nonce` in
    ///   production
    /// - The header is authenticated as associated data
    pub fn seal(
        plaintext: &[u8],
        passphrase: &str,
        kdf_rounds: u32,
        salt: [u8; SALT_SIZE],
        nonce: [u8; NONCE_SIZE],
    ) -> Result<Self, CryptoError> {
        let kdf_rounds = validate_rounds(kdf_rounds)?;
        let key = derive_key(passphrase, &salt, kdf_rounds);
        let cipher = XChaCha20Poly1305::new(key.key().into());

        let header = encode_header(kdf_rounds, &salt, &nonce);
        let payload = Payload { msg: plaintext, aad: &header };
        let Ok(ciphertext) = cipher.encrypt(XNonce::from_slice(&nonce), payload) else {
            unreachable!("XChaCha20-Poly1305 encryption cannot fail with valid inputs");
        };

        Ok(Self { kdf_rounds, salt, nonce, ciphertext })
    }

    /// Open the message with a passphrase.
    ///
    /// # Errors
    ///
    /// - `InvalidKdfRounds`: header carries an out-of-range round count
    /// - `DecryptionFailed`: wrong passphrase or tampered message
    pub fn open(&self, passphrase: &str) -> Result<Vec<u8>, CryptoError> {
        let kdf_rounds = validate_rounds(self.kdf_rounds)?;
        let key = derive_key(passphrase, &self.salt, kdf_rounds);
        let cipher = XChaCha20Poly1305::new(key.key().into());

        let header = encode_header(kdf_rounds, &self.salt, &self.nonce);
        let payload = Payload { msg: self.ciphertext.as_slice(), aad: &header };
        cipher
            .decrypt(XNonce::from_slice(&self.nonce), payload)
            .map_err(|_| CryptoError::DecryptionFailed)
    }

    /// Plaintext length (ciphertext length minus authentication tag).
    pub fn plaintext_len(&self) -> usize {
        self.ciphertext.len().saturating_sub(POLY1305_TAG_SIZE)
    }

    /// Binary encoding: header followed by ciphertext.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE + self.ciphertext.len());
        bytes.extend_from_slice(&encode_header(self.kdf_rounds, &self.salt, &self.nonce));
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    /// Parse the binary encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() < HEADER_SIZE + POLY1305_TAG_SIZE {
            return Err(CryptoError::MalformedArmor {
                reason: format!("message too short: {} bytes", bytes.len()),
            });
        }

        let (header, ciphertext) = bytes.split_at(HEADER_SIZE);

        let version = header[0];
        if version != MESSAGE_VERSION {
            return Err(CryptoError::UnsupportedVersion(version));
        }

        let mut rounds = [0u8; 4];
        rounds.copy_from_slice(&header[1..5]);
        let kdf_rounds = validate_rounds(u32::from_be_bytes(rounds))?;

        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&header[5..5 + SALT_SIZE]);

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&header[5 + SALT_SIZE..HEADER_SIZE]);

        Ok(Self { kdf_rounds, salt, nonce, ciphertext: ciphertext.to_vec() })
    }
}

/// Seal and armor a plaintext.
pub fn encrypt_armored(
    plaintext: &[u8],
    passphrase: &str,
    kdf_rounds: u32,
    salt: [u8; SALT_SIZE],
    nonce: [u8; NONCE_SIZE],
) -> Result<String, CryptoError> {
    let sealed = SealedMessage::seal(plaintext, passphrase, kdf_rounds, salt, nonce)?;
    Ok(armor::encode_armor(&sealed.to_bytes()))
}

/// Dearmor and open a message.
pub fn decrypt_armored(armored: &str, passphrase: &str) -> Result<Vec<u8>, CryptoError> {
    let bytes = armor::decode_armor(armored)?;
    SealedMessage::from_bytes(&bytes)?.open(passphrase)
}

/// Header layout:
/// - byte 0: format version
/// - bytes 1-4: KDF rounds (big-endian)
/// - bytes 5-20: salt
/// - bytes 21-44: nonce
fn encode_header(
    kdf_rounds: u32,
    salt: &[u8; SALT_SIZE],
    nonce: &[u8; NONCE_SIZE],
) -> [u8; HEADER_SIZE] {
    let mut header = [0u8; HEADER_SIZE];
    header[0] = MESSAGE_VERSION;
    header[1..5].copy_from_slice(&kdf_rounds.to_be_bytes());
    header[5..5 + SALT_SIZE].copy_from_slice(salt);
    header[5 + SALT_SIZE..].copy_from_slice(nonce);
    header
}
