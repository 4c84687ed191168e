//! Gate configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use fpw_common::{Error, Result};

/// Directory name under the user's config directory.
pub const APP_DIRNAME: &str = "fpw";

/// Credential record file name.
pub const CREDENTIALS_FILENAME: &str = ".shadow";

/// Session record file name.
pub const SESSIONS_FILENAME: &str = ".sessions";

/// How long an unused session stays valid.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(3600);

/// Password attempts allowed per entry.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Settings for an [`AccessController`](crate::AccessController).
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Directory holding the credential and session records.
    pub config_dir: PathBuf,
    /// Idle time after which a session expires.
    pub session_ttl: Duration,
    /// Password attempts allowed before entry is denied.
    pub max_attempts: u32,
}

impl GateConfig {
    /// Create a configuration rooted at `config_dir` with default limits.
    pub fn new(config_dir: impl AsRef<Path>) -> Self {
        Self {
            config_dir: config_dir.as_ref().to_path_buf(),
            session_ttl: DEFAULT_SESSION_TTL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Create a configuration in the platform config directory
    /// (`~/.config/fpw` on Linux).
    ///
    /// # Errors
    /// - No config directory can be determined for the current user
    pub fn from_default_dir() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Storage("Could not find config directory".to_string()))?;
        Ok(Self::new(config_dir.join(APP_DIRNAME)))
    }

    /// Override the session time-to-live.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Override the attempt limit. At least one attempt is always allowed.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Full path of the credential record.
    pub fn credentials_path(&self) -> PathBuf {
        self.config_dir.join(CREDENTIALS_FILENAME)
    }

    /// Full path of the session record.
    pub fn sessions_path(&self) -> PathBuf {
        self.config_dir.join(SESSIONS_FILENAME)
    }
}
