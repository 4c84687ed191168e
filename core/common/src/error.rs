//! Common error types for fpw.

use thiserror::Error;

/// Top-level error type for fpw operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Target path does not exist or is not a directory.
    #[error("'{0}' is not a valid folder")]
    InvalidFolder(String),

    /// Operation requires a password that was never set for the folder.
    #[error("No password is set for '{0}'")]
    NotProtected(String),

    /// Password verification failed.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Every allowed attempt was used without a match.
    #[error("Access denied after {attempts} failed attempts")]
    LockedOut { attempts: u32 },

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Password could not be read from the user.
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Whether the error means the request was refused, as opposed to the
    /// tool itself failing.
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            Error::InvalidFolder(_)
                | Error::NotProtected(_)
                | Error::AuthenticationFailed(_)
                | Error::LockedOut { .. }
        )
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
