//! Persisted unlock sessions with time-to-live.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::clock::{Clock, Timestamp};
use crate::provider::StorageProvider;
use fpw_common::{Error, FolderPath, Result};

/// Mapping from canonical folder path to last-access time.
///
/// A session is valid while `now - last_access < ttl`. Two kinds of
/// checks exist: [`SessionStore::is_valid`] refreshes or expires the
/// session as a side effect, [`SessionStore::is_active`] only looks.
///
/// Concurrent processes are not coordinated. One process can expire a
/// session while another refreshes it; whichever rewrites the record last
/// wins.
pub struct SessionStore {
    provider: Arc<dyn StorageProvider>,
    record: String,
    clock: Arc<dyn Clock>,
    sessions: BTreeMap<String, Timestamp>,
}

impl SessionStore {
    /// Load the session record.
    ///
    /// An unreadable or corrupt record is logged and treated as empty:
    /// losing sessions only means asking for a password again.
    pub fn open(
        provider: Arc<dyn StorageProvider>,
        record: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let record = record.into();
        let sessions = match provider.read(&record) {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(sessions) => sessions,
                Err(e) => {
                    warn!("Session record '{}' is corrupt, starting empty: {}", record, e);
                    BTreeMap::new()
                }
            },
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                warn!("Session record '{}' is unreadable, starting empty: {}", record, e);
                BTreeMap::new()
            }
        };

        debug!("Loaded {} session(s)", sessions.len());

        Self {
            provider,
            record,
            clock,
            sessions,
        }
    }

    /// Check for a live session, refreshing or expiring it.
    ///
    /// # Postconditions
    /// - Valid session: `last_access` is now, persisted
    /// - Expired session: removed, persisted
    /// - No session: nothing written
    ///
    /// # Errors
    /// - Persisting the refresh or expiry failed
    pub fn is_valid(&mut self, folder: &FolderPath, ttl: Duration) -> Result<bool> {
        let Some(&last_access) = self.sessions.get(folder.as_str()) else {
            return Ok(false);
        };

        let now = self.clock.now();
        let mut next = self.sessions.clone();
        let valid = now - last_access < ttl.as_secs_f64();

        if valid {
            next.insert(folder.as_str().to_string(), now);
        } else {
            debug!("Session for {} expired", folder);
            next.remove(folder.as_str());
        }

        self.persist(&next)?;
        self.sessions = next;
        Ok(valid)
    }

    /// Whether any session is recorded for the folder. Never mutates.
    pub fn is_active(&self, folder: &FolderPath) -> bool {
        self.sessions.contains_key(folder.as_str())
    }

    /// Last access time of the folder's session. Never mutates.
    pub fn last_access(&self, folder: &FolderPath) -> Option<Timestamp> {
        self.sessions.get(folder.as_str()).copied()
    }

    /// Seconds since the folder's session was last used. Never mutates.
    pub fn idle_seconds(&self, folder: &FolderPath) -> Option<f64> {
        self.last_access(folder)
            .map(|last| (self.clock.now() - last).max(0.0))
    }

    /// Start or restart a session at the current time.
    pub fn create(&mut self, folder: &FolderPath) -> Result<()> {
        let mut next = self.sessions.clone();
        next.insert(folder.as_str().to_string(), self.clock.now());
        self.persist(&next)?;
        self.sessions = next;
        Ok(())
    }

    /// End a session.
    ///
    /// # Returns
    /// - `Ok(false)` without touching storage if there was no session
    pub fn remove(&mut self, folder: &FolderPath) -> Result<bool> {
        if !self.is_active(folder) {
            return Ok(false);
        }

        let mut next = self.sessions.clone();
        next.remove(folder.as_str());
        self.persist(&next)?;
        self.sessions = next;
        Ok(true)
    }

    /// Copy of every recorded session.
    pub fn snapshot(&self) -> BTreeMap<String, Timestamp> {
        self.sessions.clone()
    }

    /// Number of recorded sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Check if no session is recorded.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn persist(&self, sessions: &BTreeMap<String, Timestamp>) -> Result<()> {
        let bytes =
            serde_json::to_vec(sessions).map_err(|e| Error::Serialization(e.to_string()))?;
        self.provider.write(&self.record, &bytes)
    }
}
