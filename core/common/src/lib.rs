//! Common utilities and types shared across fpw modules.
//!
//! This module provides the error taxonomy and the two value types every
//! other crate passes around: the canonical folder identity and the
//! user's password.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{FolderPath, Password};
