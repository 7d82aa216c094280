//! Fuzz target for sealed message integrity
//!
//! Seals a plaintext, then tampers with the binary or armored form.
//!
//! # Strategy
//!
//! - Arbitrary plaintexts and passphrases (empty, unicode, long)
//! - Single bit flips anywhere in the encoded message
//! - Truncation and trailing garbage
//! - Wrong passphrases
//!
//! # Invariants
//!
//! - Seal/open roundtrip succeeds with the sealing passphrase
//! - Any modified byte makes opening fail
//! - A different passphrase never opens the message
//! - Parsing never panics

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use passgate_crypto::{
    CryptoError, MIN_KDF_ROUNDS, NONCE_SIZE, SALT_SIZE, SealedMessage, decrypt_armored,
    encode_armor,
};

#[derive(Debug, Clone, Arbitrary)]
struct SealScenario {
    plaintext: Vec<u8>,
    passphrase: String,
    salt: [u8; SALT_SIZE],
    nonce: [u8; NONCE_SIZE],
    tamper: Tamper,
}

#[derive(Debug, Clone, Arbitrary)]
enum Tamper {
    /// Leave the message alone
    None,
    /// Flip one bit at a position (wrapped to the message length)
    FlipBit { position: u16, bit: u8 },
    /// Cut the message short
    Truncate { keep: u16 },
    /// Append bytes after the tag
    Extend { extra: Vec<u8> },
    /// Open with another passphrase
    WrongPassphrase { other: String },
}

fuzz_target!(|scenario: SealScenario| {
    let Ok(sealed) = SealedMessage::seal(
        &scenario.plaintext,
        &scenario.passphrase,
        MIN_KDF_ROUNDS,
        scenario.salt,
        scenario.nonce,
    ) else {
        panic!("sealing with valid rounds must succeed");
    };

    let mut bytes = sealed.to_bytes();
    let mut passphrase = scenario.passphrase.clone();
    let mut modified = true;

    match scenario.tamper {
        Tamper::None => modified = false,
        Tamper::FlipBit { position, bit } => {
            let index = usize::from(position) % bytes.len();
            bytes[index] ^= 1 << (bit % 8);
        },
        Tamper::Truncate { keep } => {
            let keep = usize::from(keep) % bytes.len();
            bytes.truncate(keep);
        },
        Tamper::Extend { extra } => {
            if extra.is_empty() {
                modified = false;
            }
            bytes.extend_from_slice(&extra);
        },
        Tamper::WrongPassphrase { other } => {
            if other == passphrase {
                modified = false;
            }
            passphrase = other;
        },
    }

    let result = decrypt_armored(&encode_armor(&bytes), &passphrase);

    if modified {
        assert!(result.is_err(), "tampered message opened");
    } else {
        assert_eq!(result, Ok(scenario.plaintext));
    }

    if let Err(e) = result {
        // Round count survives a flip only if it stays in range
        assert!(
            matches!(
                e,
                CryptoError::DecryptionFailed
                    | CryptoError::MalformedArmor { .. }
                    | CryptoError::UnsupportedVersion(_)
                    | CryptoError::InvalidKdfRounds(_)
            ),
            "unexpected error: {e:?}"
        );
    }
});
