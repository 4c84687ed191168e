//! In-memory storage provider for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::provider::StorageProvider;
use fpw_common::{Error, Result};

/// In-memory storage provider.
///
/// Useful for testing and development. All data is stored in memory
/// and lost on drop. Clones share the same records, which lets a test
/// reopen a store "after a restart" against the same data.
#[derive(Clone, Default)]
pub struct MemoryProvider {
    storage: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryProvider {
    /// Create a new empty memory provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, to exercise error propagation.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.storage.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Check if no record was ever written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageProvider for MemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    fn read(&self, record: &str) -> Result<Option<Vec<u8>>> {
        let storage = self
            .storage
            .read()
            .map_err(|_| Error::Storage("Memory storage lock poisoned".to_string()))?;
        Ok(storage.get(record).cloned())
    }

    fn write(&self, record: &str, data: &[u8]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!(
                "Simulated write failure for '{}'",
                record
            )));
        }

        let mut storage = self
            .storage
            .write()
            .map_err(|_| Error::Storage("Memory storage lock poisoned".to_string()))?;
        storage.insert(record.to_string(), data.to_vec());
        Ok(())
    }
}
