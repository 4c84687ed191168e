//! Salted password hashing using SHA-256.
//!
//! The digest is `SHA-256(password || salt)`, hex-encoded. The salt is the
//! folder's canonical path, which keeps digests distinct across folders but
//! is public knowledge rather than a secret.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use subtle::ConstantTimeEq;

use fpw_common::Password;

/// Length of a hex-encoded SHA-256 digest.
pub const HASH_HEX_LENGTH: usize = 64;

/// Hex-encoded salted password digest, as stored on disk.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a stored hex digest.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Get the hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PasswordHash([REDACTED; {} chars])", self.0.len())
    }
}

/// Hash a password with the given salt.
///
/// # Postconditions
/// - Output is deterministic for the same inputs
/// - Output is 64 lowercase hex characters
///
/// # Security
/// - Password is not stored or logged
pub fn hash_password(password: &Password, salt: &str) -> PasswordHash {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    PasswordHash(hex::encode(hasher.finalize()))
}

/// Compare a candidate digest with the stored one in constant time.
pub fn verify_hash(candidate: &PasswordHash, stored: &PasswordHash) -> bool {
    candidate.0.as_bytes().ct_eq(stored.0.as_bytes()).into()
}
