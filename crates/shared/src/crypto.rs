//! Hashing helpers for admin API keys.

use sha2::{Digest, Sha256};

/// Prefix every admin key starts with.
pub const ADMIN_KEY_PREFIX: &str = "fx_";

/// Minimum admin key length (prefix plus 8 characters).
const MIN_ADMIN_KEY_LEN: usize = 11;

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Extracts the display prefix from an admin key (first 8 characters after "fx_").
pub fn extract_key_prefix(key: &str) -> Option<&str> {
    if key.starts_with(ADMIN_KEY_PREFIX) && key.len() >= MIN_ADMIN_KEY_LEN {
        key.get(3..11)
    } else {
        None
    }
}

/// Compares two hex digests without short-circuiting on the first mismatch.
pub fn digests_match(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
