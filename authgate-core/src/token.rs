use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Number of random bytes in every generated token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Generates an opaque, URL-safe random token.
///
/// Used for both CSRF states and session identifiers. Each call draws fresh
/// bytes from the thread-local CSPRNG, so two tokens are never derived from
/// one another.
pub fn generate_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compares two strings in time independent of where they first differ.
///
/// Both inputs are hashed first so that differing lengths do not
/// short-circuit the comparison.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = Sha256::digest(a.as_bytes());
    let b = Sha256::digest(b.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
