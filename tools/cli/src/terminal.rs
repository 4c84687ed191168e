//! Terminal password prompt.

use fpw_common::{Error, Password, Result};
use fpw_gate::PasswordPrompt;

/// Reads passwords from the controlling terminal without echo.
///
/// Notices go to stderr so stdout only carries command output.
pub struct TerminalPrompt;

impl PasswordPrompt for TerminalPrompt {
    fn read_password(&mut self, prompt: &str) -> Result<Password> {
        rpassword::prompt_password(prompt)
            .map(Password::new)
            .map_err(|e| Error::Prompt(format!("Failed to read password: {}", e)))
    }

    fn notify(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}
