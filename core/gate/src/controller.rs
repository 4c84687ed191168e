//! Access controller: decides whether an entry request reuses a session,
//! needs a password, or is refused, and runs the password management flows.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::authenticator::{AuthOutcome, Authenticator};
use crate::config::{GateConfig, CREDENTIALS_FILENAME, SESSIONS_FILENAME};
use crate::prompt::PasswordPrompt;
use crate::session::{AccessState, SessionGuard};
use fpw_common::{Error, FolderPath, Password, Result};
use fpw_storage::{
    Clock, CredentialStore, LocalProvider, SessionStore, StorageProvider, SystemClock,
};

/// What `set_password` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordChange {
    /// The folder was not protected before.
    Created,
    /// An existing password was replaced.
    Changed,
}

/// Protection status of one folder in a listing.
#[derive(Debug, Clone, PartialEq)]
pub enum Protection {
    /// Protected, no session recorded.
    Locked,
    /// Protected with a recorded session.
    ActiveSession {
        /// Seconds since the session was last used.
        idle_seconds: f64,
    },
}

impl fmt::Display for Protection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locked => write!(f, "locked"),
            Self::ActiveSession { .. } => write!(f, "active session"),
        }
    }
}

/// One row of [`AccessController::list`].
#[derive(Debug, Clone, PartialEq)]
pub struct FolderStatus {
    pub folder: FolderPath,
    pub protection: Protection,
}

/// Orchestrates credentials, sessions and authentication.
pub struct AccessController {
    config: GateConfig,
    credentials: CredentialStore,
    sessions: SessionStore,
    authenticator: Authenticator,
    state: AccessState,
}

impl AccessController {
    /// Open the stores in `config.config_dir` on the local filesystem.
    ///
    /// # Errors
    /// - Credential record exists but is unreadable or corrupt
    pub fn open(config: GateConfig) -> Result<Self> {
        let provider = Arc::new(LocalProvider::new(&config.config_dir));
        Self::with_provider(config, provider, Arc::new(SystemClock))
    }

    /// Open the stores on an arbitrary provider and clock.
    pub fn with_provider(
        config: GateConfig,
        provider: Arc<dyn StorageProvider>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        debug!("Opening stores on {} provider", provider.name());
        let credentials = CredentialStore::open(provider.clone(), CREDENTIALS_FILENAME)?;
        let sessions = SessionStore::open(provider, SESSIONS_FILENAME, clock);
        let authenticator = Authenticator::new(config.max_attempts);

        Ok(Self {
            config,
            credentials,
            sessions,
            authenticator,
            state: AccessState::Locked,
        })
    }

    /// Current state of the gate.
    pub fn state(&self) -> AccessState {
        self.state
    }

    /// Read access to the credential store.
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Read access to the session store.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Unlock a folder, reusing a live session when there is one.
    ///
    /// # Postconditions
    /// - On success the state is `SessionActive` and a session record
    ///   exists until the returned guard is closed or dropped
    /// - On failure the state is `Denied` and no session was created
    ///
    /// # Errors
    /// - `NotProtected` if no password is set for the folder
    /// - `LockedOut` if every attempt failed
    /// - Prompt or storage failures
    pub fn enter(
        &mut self,
        folder: &FolderPath,
        prompt: &mut dyn PasswordPrompt,
    ) -> Result<SessionGuard<'_>> {
        self.state = AccessState::Locked;

        let reused = match self.authenticate_entry(folder, prompt) {
            Ok(reused) => reused,
            Err(e) => {
                self.state = AccessState::Denied;
                return Err(e);
            }
        };

        self.state = AccessState::SessionActive;
        Ok(SessionGuard::new(self, folder.clone(), reused))
    }

    /// Returns whether an existing session was reused.
    fn authenticate_entry(
        &mut self,
        folder: &FolderPath,
        prompt: &mut dyn PasswordPrompt,
    ) -> Result<bool> {
        let stored = self
            .credentials
            .get(folder)
            .cloned()
            .ok_or_else(|| Error::NotProtected(folder.to_string()))?;

        if self.sessions.is_valid(folder, self.config.session_ttl)? {
            info!("Existing session used for {}", folder);
            return Ok(true);
        }

        self.state = AccessState::Authenticating;
        match self.authenticator.prompt_and_verify(folder, &stored, prompt)? {
            AuthOutcome::Success => {
                self.sessions.create(folder)?;
                info!("Authenticated, session started for {}", folder);
                Ok(false)
            }
            AuthOutcome::LockedOut => {
                warn!("Access to {} denied after failed attempts", folder);
                Err(Error::LockedOut {
                    attempts: self.authenticator.max_attempts(),
                })
            }
        }
    }

    /// End the folder's session. Called by [`SessionGuard`].
    pub(crate) fn leave(&mut self, folder: &FolderPath) -> Result<()> {
        self.state = AccessState::Locked;
        self.sessions.remove(folder)?;
        info!("Session closed for {}", folder);
        Ok(())
    }

    /// Set a password on an unprotected folder, or change an existing one.
    ///
    /// Changing requires the current password first (one attempt). The new
    /// password is asked twice; an empty or mismatched pair is reported and
    /// asked again.
    ///
    /// # Errors
    /// - `AuthenticationFailed` if the current password is wrong
    /// - Prompt or storage failures
    pub fn set_password(
        &mut self,
        folder: &FolderPath,
        prompt: &mut dyn PasswordPrompt,
    ) -> Result<PasswordChange> {
        let change = match self.credentials.get(folder) {
            Some(stored) => {
                let stored = stored.clone();
                if !self
                    .authenticator
                    .verify_once(folder, &stored, prompt, "Current password: ")?
                {
                    return Err(Error::AuthenticationFailed(
                        "incorrect current password".to_string(),
                    ));
                }
                PasswordChange::Changed
            }
            None => PasswordChange::Created,
        };

        prompt.notify("Choose a new password.");
        let password = loop {
            let first = prompt.read_password("New password: ")?;
            let confirm = prompt.read_password("Confirm password: ")?;
            match validate_new_password(first, &confirm) {
                Ok(password) => break password,
                Err(e) => prompt.notify(&e.to_string()),
            }
        };

        let hash = self.authenticator.hash(&password, folder);
        self.credentials.set(folder, hash)?;
        info!("Password {:?} for {}", change, folder);
        Ok(change)
    }

    /// Remove protection from a folder after checking its password.
    ///
    /// Any session for the folder is cleared as well.
    ///
    /// # Errors
    /// - `NotProtected` if no password is set
    /// - `AuthenticationFailed` if the password is wrong
    /// - Prompt or storage failures
    pub fn remove_password(
        &mut self,
        folder: &FolderPath,
        prompt: &mut dyn PasswordPrompt,
    ) -> Result<()> {
        let stored = self
            .credentials
            .get(folder)
            .cloned()
            .ok_or_else(|| Error::NotProtected(folder.to_string()))?;

        if !self
            .authenticator
            .verify_once(folder, &stored, prompt, "Current password: ")?
        {
            return Err(Error::AuthenticationFailed("incorrect password".to_string()));
        }

        self.credentials.remove(folder)?;
        self.sessions.remove(folder)?;
        info!("Protection removed from {}", folder);
        Ok(())
    }

    /// Every protected folder with its session status.
    ///
    /// Read-only: sessions are neither refreshed nor expired.
    pub fn list(&self) -> Vec<FolderStatus> {
        self.credentials
            .entries()
            .map(|(folder, _)| {
                let protection = match self.sessions.idle_seconds(&folder) {
                    Some(idle_seconds) => Protection::ActiveSession { idle_seconds },
                    None => Protection::Locked,
                };
                FolderStatus { folder, protection }
            })
            .collect()
    }
}

/// Accept a new password only if both entries match and it is non-empty.
fn validate_new_password(first: Password, confirm: &Password) -> Result<Password> {
    if &first != confirm {
        return Err(Error::InvalidInput(
            "Passwords do not match. Try again.".to_string(),
        ));
    }
    if first.is_empty() {
        return Err(Error::InvalidInput("Password cannot be empty.".to_string()));
    }
    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompt;
    use fpw_storage::{ManualClock, MemoryProvider};
    use proptest::prelude::*;
    use std::time::Duration;

    const START: f64 = 1_700_000_000.0;

    struct Fixture {
        provider: Arc<MemoryProvider>,
        clock: ManualClock,
        controller: AccessController,
    }

    impl Fixture {
        fn new() -> Self {
            let provider = Arc::new(MemoryProvider::new());
            let clock = ManualClock::new(START);
            let controller = Self::open(&provider, &clock);
            Self {
                provider,
                clock,
                controller,
            }
        }

        fn open(provider: &Arc<MemoryProvider>, clock: &ManualClock) -> AccessController {
            AccessController::with_provider(
                GateConfig::new("/unused"),
                provider.clone(),
                Arc::new(clock.clone()),
            )
            .unwrap()
        }

        /// Simulate a fresh process over the same storage.
        fn restart(&mut self) {
            self.controller = Self::open(&self.provider, &self.clock);
        }

        fn protect(&mut self, folder: &FolderPath, password: &str) {
            let mut prompt = ScriptedPrompt::new([password, password]);
            self.controller.set_password(folder, &mut prompt).unwrap();
        }
    }

    fn folder() -> FolderPath {
        FolderPath::from_canonical("/tmp/x")
    }

    #[test]
    fn test_set_then_enter() {
        let mut fx = Fixture::new();
        fx.protect(&folder(), "hunter2");

        let stored = fx.controller.credentials().get(&folder()).unwrap();
        assert_eq!(
            stored.as_str(),
            "3cd84474dfcc0d661a940769aa2bff07348b02bf23bd6b8c67b10ae886107ccd"
        );

        let mut prompt = ScriptedPrompt::new(["hunter2"]);
        let guard = fx.controller.enter(&folder(), &mut prompt).unwrap();
        assert_eq!(guard.folder(), &folder());
        assert!(!guard.reused_session());
        drop(guard);

        assert_eq!(fx.controller.state(), AccessState::Locked);
        assert!(fx.controller.sessions().is_empty());
    }

    #[test]
    fn test_session_exists_while_guard_alive() {
        let mut fx = Fixture::new();
        fx.protect(&folder(), "pw");

        let mut prompt = ScriptedPrompt::new(["pw"]);
        let guard = fx.controller.enter(&folder(), &mut prompt).unwrap();

        // Another process would see the session on disk.
        let other = Fixture::open(&fx.provider, &fx.clock);
        assert!(other.sessions().is_active(&folder()));

        guard.close().unwrap();
        let other = Fixture::open(&fx.provider, &fx.clock);
        assert!(!other.sessions().is_active(&folder()));
    }

    #[test]
    fn test_enter_unprotected_folder() {
        let mut fx = Fixture::new();
        let mut prompt = ScriptedPrompt::new(["anything"]);

        let result = fx.controller.enter(&folder(), &mut prompt);
        assert!(matches!(result, Err(Error::NotProtected(_))));
        drop(result);
        assert_eq!(fx.controller.state(), AccessState::Denied);
        assert!(prompt.prompts().is_empty());
    }

    #[test]
    fn test_lockout_creates_no_session() {
        let mut fx = Fixture::new();
        fx.protect(&folder(), "hunter2");

        let mut prompt = ScriptedPrompt::new(["a", "b", "c"]);
        let result = fx.controller.enter(&folder(), &mut prompt);

        assert!(matches!(result, Err(Error::LockedOut { attempts: 3 })));
        drop(result);
        assert_eq!(fx.controller.state(), AccessState::Denied);
        assert!(fx.controller.sessions().is_empty());
        assert_eq!(prompt.messages().len(), 3);
    }

    #[test]
    fn test_second_entry_skips_prompt() {
        let mut fx = Fixture::new();
        fx.protect(&folder(), "pw");

        // A previous shell is still running in this folder.
        let mut prompt = ScriptedPrompt::new(["pw"]);
        std::mem::forget(fx.controller.enter(&folder(), &mut prompt).unwrap());
        fx.restart();

        fx.clock.advance(1800.0);
        let mut prompt = ScriptedPrompt::new(Vec::<String>::new());
        let guard = fx.controller.enter(&folder(), &mut prompt).unwrap();

        assert!(guard.reused_session());
        assert!(prompt.prompts().is_empty());
        drop(guard);
    }

    #[test]
    fn test_reuse_refreshes_last_access() {
        let mut fx = Fixture::new();
        fx.protect(&folder(), "pw");
        fx.controller.sessions.create(&folder()).unwrap();

        fx.clock.advance(1800.0);
        let mut prompt = ScriptedPrompt::new(Vec::<String>::new());
        let guard = fx.controller.enter(&folder(), &mut prompt).unwrap();
        assert!(guard.reused_session());
        // Keep the session record instead of tearing it down.
        std::mem::forget(guard);

        let refreshed = fx.controller.sessions().last_access(&folder());
        assert_eq!(refreshed, Some(START + 1800.0));
    }

    #[test]
    fn test_expired_session_requires_password() {
        let mut fx = Fixture::new();
        fx.protect(&folder(), "pw");
        fx.controller.sessions.create(&folder()).unwrap();

        fx.clock.advance(3600.0);
        let mut prompt = ScriptedPrompt::new(["pw"]);
        let guard = fx.controller.enter(&folder(), &mut prompt).unwrap();

        assert!(!guard.reused_session());
        assert_eq!(prompt.prompts(), ["Password: "]);
    }

    #[test]
    fn test_custom_ttl() {
        let provider = Arc::new(MemoryProvider::new());
        let clock = ManualClock::new(START);
        let config = GateConfig::new("/unused").with_session_ttl(Duration::from_secs(60));
        let mut controller =
            AccessController::with_provider(config, provider, Arc::new(clock.clone())).unwrap();

        let mut prompt = ScriptedPrompt::new(["pw", "pw"]);
        controller.set_password(&folder(), &mut prompt).unwrap();
        controller.sessions.create(&folder()).unwrap();

        clock.advance(61.0);
        let mut prompt = ScriptedPrompt::new(Vec::<String>::new());
        assert!(matches!(
            controller.enter(&folder(), &mut prompt),
            Err(Error::Prompt(_))
        ));
        assert!(controller.sessions().is_empty());
    }

    #[test]
    fn test_credentials_survive_restart() {
        let mut fx = Fixture::new();
        fx.protect(&folder(), "pw");
        fx.restart();

        let mut prompt = ScriptedPrompt::new(["pw"]);
        assert!(fx.controller.enter(&folder(), &mut prompt).is_ok());
    }

    #[test]
    fn test_set_retries_on_mismatch_and_empty() {
        let mut fx = Fixture::new();
        let mut prompt = ScriptedPrompt::new(["one", "two", "", "", "good", "good"]);

        let change = fx.controller.set_password(&folder(), &mut prompt).unwrap();
        assert_eq!(change, PasswordChange::Created);
        assert_eq!(
            prompt.messages(),
            [
                "Choose a new password.",
                "Invalid input: Passwords do not match. Try again.",
                "Invalid input: Password cannot be empty.",
            ]
        );

        let mut prompt = ScriptedPrompt::new(["good"]);
        assert!(fx.controller.enter(&folder(), &mut prompt).is_ok());
    }

    #[test]
    fn test_change_requires_current_password() {
        let mut fx = Fixture::new();
        fx.protect(&folder(), "old");

        let mut prompt = ScriptedPrompt::new(["wrong", "new", "new"]);
        let result = fx.controller.set_password(&folder(), &mut prompt);
        assert!(matches!(result, Err(Error::AuthenticationFailed(_))));
        assert_eq!(prompt.remaining(), 2);

        let mut prompt = ScriptedPrompt::new(["old", "new", "new"]);
        let change = fx.controller.set_password(&folder(), &mut prompt).unwrap();
        assert_eq!(change, PasswordChange::Changed);
        assert_eq!(prompt.prompts()[0], "Current password: ");

        let mut prompt = ScriptedPrompt::new(["old", "old", "old"]);
        assert!(fx.controller.enter(&folder(), &mut prompt).is_err());
        let mut prompt = ScriptedPrompt::new(["new"]);
        assert!(fx.controller.enter(&folder(), &mut prompt).is_ok());
    }

    #[test]
    fn test_remove_requires_password() {
        let mut fx = Fixture::new();
        fx.protect(&folder(), "pw");

        let mut prompt = ScriptedPrompt::new(["wrong"]);
        assert!(matches!(
            fx.controller.remove_password(&folder(), &mut prompt),
            Err(Error::AuthenticationFailed(_))
        ));
        assert!(fx.controller.credentials().contains(&folder()));

        fx.controller.sessions.create(&folder()).unwrap();
        let mut prompt = ScriptedPrompt::new(["pw"]);
        fx.controller.remove_password(&folder(), &mut prompt).unwrap();
        assert!(!fx.controller.credentials().contains(&folder()));
        assert!(fx.controller.sessions().is_empty());

        let mut prompt = ScriptedPrompt::new(["pw"]);
        assert!(matches!(
            fx.controller.enter(&folder(), &mut prompt),
            Err(Error::NotProtected(_))
        ));
    }

    #[test]
    fn test_remove_unprotected_folder() {
        let mut fx = Fixture::new();
        let mut prompt = ScriptedPrompt::new(["pw"]);
        assert!(matches!(
            fx.controller.remove_password(&folder(), &mut prompt),
            Err(Error::NotProtected(_))
        ));
    }

    #[test]
    fn test_orphaned_session_is_ignored() {
        let mut fx = Fixture::new();
        fx.controller.sessions.create(&folder()).unwrap();

        let mut prompt = ScriptedPrompt::new(Vec::<String>::new());
        assert!(matches!(
            fx.controller.enter(&folder(), &mut prompt),
            Err(Error::NotProtected(_))
        ));
        assert!(fx.controller.list().is_empty());
    }

    #[test]
    fn test_list_is_read_only() {
        let mut fx = Fixture::new();
        let a = FolderPath::from_canonical("/srv/a");
        let b = FolderPath::from_canonical("/srv/b");
        fx.protect(&a, "pw");
        fx.protect(&b, "pw");
        fx.controller.sessions.create(&b).unwrap();

        // Long past the TTL: a refreshing check would expire it.
        fx.clock.advance(7200.0);
        let before = fx.controller.sessions().snapshot();
        let raw_before = fx.provider.read(SESSIONS_FILENAME).unwrap();

        let listing = fx.controller.list();

        assert_eq!(fx.controller.sessions().snapshot(), before);
        assert_eq!(fx.provider.read(SESSIONS_FILENAME).unwrap(), raw_before);
        assert_eq!(
            listing,
            vec![
                FolderStatus {
                    folder: a,
                    protection: Protection::Locked,
                },
                FolderStatus {
                    folder: b,
                    protection: Protection::ActiveSession {
                        idle_seconds: 7200.0
                    },
                },
            ]
        );
        assert_eq!(listing[1].protection.to_string(), "active session");
    }

    #[test]
    fn test_storage_failure_on_session_create() {
        let mut fx = Fixture::new();
        fx.protect(&folder(), "pw");
        fx.provider.set_fail_writes(true);

        let mut prompt = ScriptedPrompt::new(["pw"]);
        assert!(matches!(
            fx.controller.enter(&folder(), &mut prompt),
            Err(Error::Storage(_))
        ));
        assert_eq!(fx.controller.state(), AccessState::Denied);
    }

    #[test]
    fn test_local_storage_scenario() {
        let home = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        let folder = FolderPath::resolve(target.path()).unwrap();
        let config = GateConfig::new(home.path().join("fpw"));

        {
            let mut controller = AccessController::open(config.clone()).unwrap();
            let mut prompt = ScriptedPrompt::new(["hunter2", "hunter2"]);
            controller.set_password(&folder, &mut prompt).unwrap();
        }

        let mut controller = AccessController::open(config.clone()).unwrap();
        let mut prompt = ScriptedPrompt::new(["nope", "hunter2"]);
        let guard = controller.enter(&folder, &mut prompt).unwrap();
        assert_eq!(guard.folder().to_path_buf(), target.path().canonicalize().unwrap());
        assert!(config.sessions_path().exists());
        guard.close().unwrap();

        let reopened = AccessController::open(config).unwrap();
        assert!(!reopened.sessions().is_active(&folder));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_wrong_password_never_unlocks(
            password in "[a-z0-9]{1,16}",
            wrong in "[a-z0-9]{1,16}",
        ) {
            prop_assume!(password != wrong);
            let mut fx = Fixture::new();
            fx.protect(&folder(), &password);

            let mut prompt = ScriptedPrompt::new([wrong.clone(), wrong.clone(), wrong]);
            let result = fx.controller.enter(&folder(), &mut prompt);
            prop_assert!(
                matches!(result, Err(Error::LockedOut { .. })),
                "expected Error::LockedOut"
            );
            drop(result);
            prop_assert!(fx.controller.sessions().is_empty());
        }
    }
}
