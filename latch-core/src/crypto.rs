//! Password hashing and comparison
//!
//! Stored password hashes are the lowercase hex SHA-256 digest of `"{password}:{salt}"`.
//! Verification recomputes the digest and compares it with the stored value in constant time
//! via the `subtle` crate, so the comparison does not exit early on the first mismatch.

use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Generate a random salt for a new credential.
///
/// 128 bits from the thread-local CSPRNG, encoded as URL-safe base64 without padding
/// (22 characters).
pub fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
}

/// Compute the stored hash for a password and salt.
///
/// # Returns
///
/// A hex-encoded SHA-256 digest of `"{password}:{salt}"`
pub fn calculate_password_hash(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(b":");
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verify a supplied password against a stored salt and hash.
pub fn verify_password_hash(password: &str, salt: &str, stored_hash: &str) -> bool {
    let computed_hash = calculate_password_hash(password, salt);
    constant_time_compare(computed_hash.as_bytes(), stored_hash.as_bytes())
}

/// Perform constant-time comparison of two byte slices.
///
/// Slices of different length compare unequal immediately; only the length leaks.
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
