//! HMAC-SHA256 signing shared by payment verification and session tokens.
//!
//! Signatures travel as lowercase hex. Verification accepts only that exact
//! encoding, so a supplied signature must match the expected one byte for
//! byte.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Length of a hex-encoded SHA-256 MAC.
pub const SIGNATURE_HEX_LEN: usize = 64;

/// Returns the lowercase hex HMAC-SHA256 of `message` under `secret`.
pub fn sign_hex(secret: &[u8], message: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(message);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Checks `supplied` against the HMAC of `message` in constant time.
pub fn verify_hex(secret: &[u8], message: &[u8], supplied: &str) -> bool {
    if supplied.len() != SIGNATURE_HEX_LEN
        || !supplied
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    {
        return false;
    }
    let Ok(tag) = hex::decode(supplied) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(message);
    mac.verify_slice(&tag).is_ok()
}
