//! Cryptographic primitives for fpw.
//!
//! This module provides:
//! - Salted SHA-256 password digests, hex-encoded for storage
//! - Constant-time digest comparison
//!
//! # Security Guarantees
//! - Passwords are never logged; digests are redacted in `Debug` output
//! - Comparisons of stored digests do not short-circuit

pub mod hash;

pub use hash::{hash_password, verify_hash, PasswordHash, HASH_HEX_LENGTH};
