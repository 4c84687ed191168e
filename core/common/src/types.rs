//! Common types used throughout fpw.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use zeroize::Zeroize;

/// Canonical absolute path of a folder.
///
/// The string form is both the store key and the hashing salt, so two
/// spellings of the same directory must map to one `FolderPath`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderPath(String);

impl FolderPath {
    /// Resolve a user-supplied path to its canonical folder identity.
    ///
    /// # Preconditions
    /// - `path` must name an existing directory
    ///
    /// # Postconditions
    /// - Returns an absolute path with symlinks and `..` resolved
    ///
    /// # Errors
    /// - `InvalidFolder` if the path does not exist or is not a directory
    pub fn resolve(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let canonical = std::fs::canonicalize(path)
            .map_err(|_| crate::Error::InvalidFolder(path.display().to_string()))?;

        if !canonical.is_dir() {
            return Err(crate::Error::InvalidFolder(canonical.display().to_string()));
        }

        let text = canonical.to_str().ok_or_else(|| {
            crate::Error::InvalidFolder(format!("{} (path is not valid UTF-8)", canonical.display()))
        })?;

        Ok(Self(text.to_string()))
    }

    /// Wrap a string that is already a canonical path, e.g. a store key.
    pub fn from_canonical(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the path as a filesystem path.
    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf::from(&self.0)
    }

    /// Last path component, or the full path for `/`.
    pub fn name(&self) -> &str {
        Path::new(&self.0)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Password entered by the user. Zeroized on drop.
#[derive(Clone, PartialEq, Eq, Zeroize)]
#[zeroize(drop)]
pub struct Password(String);

impl Password {
    /// Wrap a password string.
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    /// Get the password bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Password([REDACTED])")
    }
}
