//! Local filesystem storage provider.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::provider::StorageProvider;
use fpw_common::{Error, Result};

/// Permission bits for the storage directory.
#[cfg(unix)]
const DIR_MODE: u32 = 0o700;

/// Permission bits for record files.
#[cfg(unix)]
const FILE_MODE: u32 = 0o600;

/// Local filesystem storage provider.
///
/// Each record is one file directly under the root directory. The root is
/// created on first write, so read-only commands leave the disk untouched.
pub struct LocalProvider {
    root: PathBuf,
}

impl LocalProvider {
    /// Create a new local provider with the given root directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a record file.
    fn record_path(&self, record: &str) -> PathBuf {
        self.root.join(record)
    }

    /// Create the root if needed and restrict it to the owner.
    fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| {
            Error::Storage(format!(
                "Failed to create storage directory '{}': {}",
                self.root.display(),
                e
            ))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.root, fs::Permissions::from_mode(DIR_MODE)).map_err(
                |e| {
                    Error::Storage(format!(
                        "Failed to set permissions on '{}': {}",
                        self.root.display(),
                        e
                    ))
                },
            )?;
        }

        Ok(())
    }
}

impl StorageProvider for LocalProvider {
    fn name(&self) -> &str {
        "local"
    }

    fn read(&self, record: &str) -> Result<Option<Vec<u8>>> {
        let path = self.record_path(record);
        match fs::read(&path) {
            Ok(data) => {
                debug!("Read {} bytes from {}", data.len(), path.display());
                Ok(Some(data))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(format!(
                "Failed to read '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    fn write(&self, record: &str, data: &[u8]) -> Result<()> {
        self.ensure_root()?;

        let path = self.record_path(record);
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(FILE_MODE);
        }

        let write_err =
            |e: std::io::Error| Error::Storage(format!("Failed to write '{}': {}", path.display(), e));

        let mut file = options.open(&path).map_err(write_err)?;
        file.write_all(data).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;

        // `mode` only applies on creation; tighten files left by older runs.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(FILE_MODE)).map_err(
                |e| {
                    Error::Storage(format!(
                        "Failed to set permissions on '{}': {}",
                        path.display(),
                        e
                    ))
                },
            )?;
        }

        debug!("Wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }
}
