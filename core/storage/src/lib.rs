//! Storage for fpw credentials and sessions.
//!
//! This module provides a small provider interface for whole-record
//! storage (local directory or memory) and the two stores built on it:
//! folder credentials and unlock sessions.
//!
//! # Design Principles
//! - Provider isolation: stores never touch the filesystem directly
//! - Whole-record rewrites: every mutation persists the full map
//! - Owner-only files on the local provider

pub mod clock;
pub mod credentials;
pub mod local;
pub mod memory;
pub mod provider;
pub mod sessions;

pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use credentials::CredentialStore;
pub use local::LocalProvider;
pub use memory::MemoryProvider;
pub use provider::StorageProvider;
pub use sessions::SessionStore;
