//! Folder gate engine for fpw.
//!
//! This module provides:
//! - Password set, change and removal for folders
//! - Entry with bounded password attempts
//! - Time-limited sessions so repeated entries skip the password
//! - A read-only listing of protected folders
//!
//! # Architecture
//! The gate sits between the command-line front end and the storage
//! crate. It never spawns processes itself: entering a folder yields a
//! [`SessionGuard`] and the caller runs the shell while holding it.

pub mod authenticator;
pub mod config;
pub mod controller;
pub mod prompt;
pub mod session;

pub use authenticator::{AuthOutcome, Authenticator};
pub use config::GateConfig;
pub use controller::{AccessController, FolderStatus, PasswordChange, Protection};
pub use prompt::{PasswordPrompt, ScriptedPrompt};
pub use session::{AccessState, SessionGuard};
