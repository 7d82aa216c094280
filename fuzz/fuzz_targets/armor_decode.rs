//! Fuzz target for armored message parsing
//!
//! Feeds arbitrary text through armor decoding, binary message parsing and
//! full decryption to find:
//! - Parser crashes or panics
//! - Slicing past the end of short headers
//! - Base64 bodies that bypass validation
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use passgate_crypto::{SealedMessage, decode_armor, decrypt_armored};

fuzz_target!(|data: &[u8]| {
    let _ = SealedMessage::from_bytes(data);

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(bytes) = decode_armor(text) {
        if let Ok(message) = SealedMessage::from_bytes(&bytes) {
            // Anything that parses must re-encode to the same bytes
            assert_eq!(message.to_bytes(), bytes);
        }
    }

    // Rounds in a fuzzed header are bounded, but keep the passphrase short
    let _ = decrypt_armored(text, "p");
});
