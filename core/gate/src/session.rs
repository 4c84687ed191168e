//! Unlocked-session handle.
//!
//! Entering a folder yields a [`SessionGuard`]. The session is torn down
//! when the guard is closed or dropped, so every way out of the protected
//! shell (normal exit, signal, error, panic unwinding) ends the session.

use tracing::{error, info};

use crate::controller::AccessController;
use fpw_common::{FolderPath, Result};

/// State of the gate for the current invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessState {
    /// No unlocked session in this process.
    Locked,
    /// Waiting for the user to prove the password.
    Authenticating,
    /// Folder unlocked; a session record exists.
    SessionActive,
    /// Entry refused. Terminal for the invocation.
    Denied,
}

/// Handle to an unlocked folder.
///
/// Holds the controller until the session ends.
pub struct SessionGuard<'a> {
    controller: &'a mut AccessController,
    folder: FolderPath,
    reused: bool,
    closed: bool,
}

impl<'a> SessionGuard<'a> {
    pub(crate) fn new(controller: &'a mut AccessController, folder: FolderPath, reused: bool) -> Self {
        Self {
            controller,
            folder,
            reused,
            closed: false,
        }
    }

    /// The unlocked folder.
    pub fn folder(&self) -> &FolderPath {
        &self.folder
    }

    /// Whether entry skipped the password because a session was live.
    pub fn reused_session(&self) -> bool {
        self.reused
    }

    /// End the session and report whether teardown was persisted.
    ///
    /// # Errors
    /// - Session record could not be rewritten
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.controller.leave(&self.folder)
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }

        info!("Tearing down session for {}", self.folder);
        if let Err(e) = self.controller.leave(&self.folder) {
            error!("Failed to remove session for {}: {}", self.folder, e);
        }
    }
}
