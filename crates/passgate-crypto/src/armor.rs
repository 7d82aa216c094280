//! ASCII armor for sealed messages.
//!
//! ```text
//! -----BEGIN PASSGATE MESSAGE-----
//! <base64, 64 columns per line>
//! -----END PASSGATE MESSAGE-----
//! ```
//!
//! Decoding tolerates surrounding whitespace, CRLF line endings and blank
//! lines inside the body.

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::CryptoError;

/// First line of an armored message.
pub const ARMOR_HEADER: &str = "-----BEGIN PASSGATE MESSAGE-----";

/// Last line of an armored message.
pub const ARMOR_FOOTER: &str = "-----END PASSGATE MESSAGE-----";

/// Base64 characters per body line.
const LINE_WIDTH: usize = 64;

/// Wrap binary message bytes in armor.
pub fn encode_armor(bytes: &[u8]) -> String {
    let body = STANDARD.encode(bytes);

    let mut out = String::with_capacity(
        ARMOR_HEADER.len() + ARMOR_FOOTER.len() + body.len() + body.len() / LINE_WIDTH + 3,
    );
    out.push_str(ARMOR_HEADER);
    out.push('\n');

    // base64 output is ASCII, so byte chunks are valid UTF-8
    for line in body.as_bytes().chunks(LINE_WIDTH) {
        out.push_str(&String::from_utf8_lossy(line));
        out.push('\n');
    }

    out.push_str(ARMOR_FOOTER);
    out.push('\n');
    out
}

/// Strip armor and decode the base64 body.
pub fn decode_armor(text: &str) -> Result<Vec<u8>, CryptoError> {
    let mut lines = text.trim().lines().map(str::trim);

    if lines.next() != Some(ARMOR_HEADER) {
        return Err(CryptoError::MalformedArmor { reason: "missing header line".to_string() });
    }

    let mut body = String::with_capacity(text.len());
    let mut closed = false;
    for line in lines.by_ref() {
        if line == ARMOR_FOOTER {
            closed = true;
            break;
        }
        body.push_str(line);
    }

    if !closed {
        return Err(CryptoError::MalformedArmor { reason: "missing footer line".to_string() });
    }

    if lines.any(|line| !line.is_empty()) {
        return Err(CryptoError::MalformedArmor {
            reason: "trailing data after footer".to_string(),
        });
    }

    if body.is_empty() {
        return Err(CryptoError::MalformedArmor { reason: "empty body".to_string() });
    }

    STANDARD
        .decode(body.as_bytes())
        .map_err(|e| CryptoError::MalformedArmor { reason: format!("invalid base64: {e}") })
}
