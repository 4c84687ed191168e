//! Password verification with bounded retries.

use tracing::debug;

use crate::prompt::PasswordPrompt;
use fpw_common::{FolderPath, Password, Result};
use fpw_crypto::{hash_password, verify_hash, PasswordHash};

/// Result of an interactive verification round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// A candidate matched.
    Success,
    /// Every attempt failed.
    LockedOut,
}

/// Hashes candidates with the folder path as salt and checks them
/// against the stored digest.
#[derive(Debug, Clone, Copy)]
pub struct Authenticator {
    max_attempts: u32,
}

impl Authenticator {
    /// Create an authenticator allowing `max_attempts` tries per round.
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// Attempts allowed per round.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Digest of `password` salted with the folder's canonical path.
    pub fn hash(&self, password: &Password, folder: &FolderPath) -> PasswordHash {
        hash_password(password, folder.as_str())
    }

    /// Compare a candidate digest with the stored one.
    pub fn verify(&self, candidate: &PasswordHash, stored: &PasswordHash) -> bool {
        verify_hash(candidate, stored)
    }

    /// Ask once and check the answer.
    ///
    /// # Errors
    /// - Password could not be read
    pub fn verify_once(
        &self,
        folder: &FolderPath,
        stored: &PasswordHash,
        prompt: &mut dyn PasswordPrompt,
        label: &str,
    ) -> Result<bool> {
        let candidate = prompt.read_password(label)?;
        Ok(self.verify(&self.hash(&candidate, folder), stored))
    }

    /// Ask up to `max_attempts` times, stopping at the first match.
    ///
    /// After each miss the user is told how many attempts remain.
    ///
    /// # Errors
    /// - Password could not be read; no further attempts are made
    pub fn prompt_and_verify(
        &self,
        folder: &FolderPath,
        stored: &PasswordHash,
        prompt: &mut dyn PasswordPrompt,
    ) -> Result<AuthOutcome> {
        for attempt in 1..=self.max_attempts {
            if self.verify_once(folder, stored, prompt, "Password: ")? {
                return Ok(AuthOutcome::Success);
            }

            let remaining = self.max_attempts - attempt;
            debug!("Failed password attempt {} for {}", attempt, folder);
            prompt.notify(&format!(
                "Incorrect password. ({} attempt{} remaining)",
                remaining,
                if remaining == 1 { "" } else { "s" }
            ));
        }

        Ok(AuthOutcome::LockedOut)
    }
}

impl Default for Authenticator {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_ATTEMPTS)
    }
}
