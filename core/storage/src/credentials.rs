//! Persisted folder credentials.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::provider::StorageProvider;
use fpw_common::{Error, FolderPath, Result};
use fpw_crypto::PasswordHash;

/// Mapping from canonical folder path to salted password digest.
///
/// Every mutation rewrites the whole record through the provider. The
/// in-memory map only changes once the write has succeeded, so a failed
/// write leaves the store exactly as it was loaded.
pub struct CredentialStore {
    provider: Arc<dyn StorageProvider>,
    record: String,
    entries: BTreeMap<String, PasswordHash>,
}

impl CredentialStore {
    /// Load the credential record.
    ///
    /// # Postconditions
    /// - A record that was never written loads as an empty store
    ///
    /// # Errors
    /// - Record exists but cannot be read
    /// - Record is not a valid path-to-digest map; credentials are never
    ///   discarded silently
    pub fn open(provider: Arc<dyn StorageProvider>, record: impl Into<String>) -> Result<Self> {
        let record = record.into();
        let entries = match provider.read(&record)? {
            Some(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                Error::Serialization(format!("Credential record '{}' is corrupt: {}", record, e))
            })?,
            None => BTreeMap::new(),
        };

        debug!(
            "Loaded {} credential(s) from {} provider",
            entries.len(),
            provider.name()
        );

        Ok(Self {
            provider,
            record,
            entries,
        })
    }

    /// Get the stored digest for a folder.
    pub fn get(&self, folder: &FolderPath) -> Option<&PasswordHash> {
        self.entries.get(folder.as_str())
    }

    /// Check whether a folder is protected.
    pub fn contains(&self, folder: &FolderPath) -> bool {
        self.entries.contains_key(folder.as_str())
    }

    /// Insert or replace the digest for a folder and persist.
    pub fn set(&mut self, folder: &FolderPath, hash: PasswordHash) -> Result<()> {
        let mut next = self.entries.clone();
        next.insert(folder.as_str().to_string(), hash);
        self.persist(&next)?;
        self.entries = next;
        Ok(())
    }

    /// Delete the digest for a folder and persist.
    ///
    /// # Returns
    /// - `Ok(false)` without touching storage if the folder was not protected
    pub fn remove(&mut self, folder: &FolderPath) -> Result<bool> {
        if !self.contains(folder) {
            return Ok(false);
        }

        let mut next = self.entries.clone();
        next.remove(folder.as_str());
        self.persist(&next)?;
        self.entries = next;
        Ok(true)
    }

    /// All protected folders in path order.
    pub fn entries(&self) -> impl Iterator<Item = (FolderPath, &PasswordHash)> {
        self.entries
            .iter()
            .map(|(path, hash)| (FolderPath::from_canonical(path.as_str()), hash))
    }

    /// Number of protected folders.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no folder is protected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self, entries: &BTreeMap<String, PasswordHash>) -> Result<()> {
        let bytes = serde_json::to_vec(entries).map_err(|e| Error::Serialization(e.to_string()))?;
        self.provider.write(&self.record, &bytes)
    }
}
