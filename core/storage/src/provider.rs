//! Storage provider trait definition.

use fpw_common::Result;

/// Storage provider trait for different backends.
///
/// A provider holds named records, each read and rewritten as a whole.
/// There is no partial update and no cross-process locking: two processes
/// rewriting the same record race, and the last writer wins. A provider that
/// wants advisory locking can take it inside `write`.
pub trait StorageProvider: Send + Sync {
    /// Get the provider name (e.g., "local", "memory").
    fn name(&self) -> &str;

    /// Read a whole record.
    ///
    /// # Returns
    /// - `Ok(None)` if the record was never written
    /// - `Ok(Some(bytes))` with the complete content otherwise
    ///
    /// # Errors
    /// - Record exists but cannot be read
    fn read(&self, record: &str) -> Result<Option<Vec<u8>>>;

    /// Replace a whole record.
    ///
    /// # Postconditions
    /// - The record holds exactly `data`
    /// - On the local provider, the record and its directory are readable
    ///   by the owner only
    ///
    /// # Errors
    /// - I/O errors; the caller must treat the record as unwritten
    fn write(&self, record: &str, data: &[u8]) -> Result<()>;
}
