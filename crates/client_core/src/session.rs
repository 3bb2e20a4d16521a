use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use shared::{domain::UserRecord, error::ServiceError, protocol::LoginRequest};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::service::DirectoryService;

/// Contents of the single persisted credential slot.
///
/// The bearer token is an opaque string; the last-seen user record rides
/// along so that a restart can come back up authenticated without a
/// revalidation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedCredential {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRecord>,
}

/// Single-slot persistent credential store.
///
/// Exactly one slot: every save overwrites it, clear empties it. Access is
/// synchronous; the slot is only touched by login, logout and initialize.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> io::Result<Option<PersistedCredential>>;
    fn save(&self, credential: &PersistedCredential) -> io::Result<()>;
    fn clear(&self) -> io::Result<()>;
}

/// Credential slot as a JSON document in one file.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> io::Result<Option<PersistedCredential>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };
        match serde_json::from_str(&raw) {
            Ok(credential) => Ok(Some(credential)),
            Err(err) => {
                // An unreadable slot is treated as absent rather than fatal.
                warn!("discarding unparsable credential slot: {err}");
                Ok(None)
            }
        }
    }

    fn save(&self, credential: &PersistedCredential) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string(credential)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        fs::write(&self.path, raw)
    }

    fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

/// In-memory slot for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryCredentialStore {
    slot: std::sync::Mutex<Option<PersistedCredential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: PersistedCredential) -> Self {
        Self {
            slot: std::sync::Mutex::new(Some(credential)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> io::Result<Option<PersistedCredential>> {
        Ok(self.slot.lock().map_err(poisoned)?.clone())
    }

    fn save(&self, credential: &PersistedCredential) -> io::Result<()> {
        *self.slot.lock().map_err(poisoned)? = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        *self.slot.lock().map_err(poisoned)? = None;
        Ok(())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> io::Error {
    io::Error::new(io::ErrorKind::Other, "credential store lock poisoned")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// The persisted slot has not been read yet.
    Initializing,
    Anonymous,
    Authenticated,
}

/// Read-only view of the session at one point in time.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub token: Option<String>,
    pub current_user: Option<UserRecord>,
}

#[derive(Debug)]
struct SessionState {
    status: SessionStatus,
    token: Option<String>,
    current_user: Option<UserRecord>,
}

/// Owner of the authentication state for the process lifetime.
///
/// Invariant: `Authenticated` holds exactly when both the token and the
/// current user are present; every other combination is `Anonymous` (after
/// initialization) or `Initializing` (before).
pub struct SessionManager {
    api: Arc<dyn DirectoryService>,
    store: Arc<dyn CredentialStore>,
    state: Mutex<SessionState>,
}

impl SessionManager {
    pub fn new(api: Arc<dyn DirectoryService>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            api,
            store,
            state: Mutex::new(SessionState {
                status: SessionStatus::Initializing,
                token: None,
                current_user: None,
            }),
        }
    }

    /// Reads the persisted slot once and settles the initial status.
    ///
    /// A present token is trusted as-is (no revalidation call); it only
    /// yields `Authenticated` when cached user info accompanies it.
    /// Idempotent: any call after the first is a no-op.
    pub async fn initialize(&self) {
        let mut state = self.state.lock().await;
        if state.status != SessionStatus::Initializing {
            return;
        }

        match self.store.load() {
            Ok(Some(PersistedCredential {
                access_token,
                user: Some(user),
            })) => {
                info!(username = %user.username, "restored persisted session");
                state.token = Some(access_token);
                state.current_user = Some(user);
                state.status = SessionStatus::Authenticated;
            }
            Ok(Some(PersistedCredential { user: None, .. })) => {
                // Token without cached user info cannot satisfy the
                // authenticated invariant.
                state.status = SessionStatus::Anonymous;
            }
            Ok(None) => {
                state.status = SessionStatus::Anonymous;
            }
            Err(err) => {
                warn!("failed to read credential slot: {err}");
                state.status = SessionStatus::Anonymous;
            }
        }
    }

    /// Authenticates against the directory service.
    ///
    /// On success the slot is overwritten and the session becomes
    /// `Authenticated`. On failure state and slot are left untouched and
    /// the error carries the server-supplied message or a default.
    pub async fn login(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<UserRecord, ServiceError> {
        let request = LoginRequest {
            username: username.into(),
            password: password.into(),
        };
        let success = self.api.login(&request).await?;

        let credential = PersistedCredential {
            access_token: success.access_token.clone(),
            user: Some(success.user.clone()),
        };
        if let Err(err) = self.store.save(&credential) {
            // The in-memory session still works; it just won't survive a
            // restart.
            warn!("failed to persist credential slot: {err}");
        }

        let mut state = self.state.lock().await;
        state.token = Some(success.access_token);
        state.current_user = Some(success.user.clone());
        state.status = SessionStatus::Authenticated;
        info!(username = %success.user.username, "logged in");
        Ok(success.user)
    }

    /// Clears the session and the persisted slot. No network call; calling
    /// it when already anonymous is a no-op.
    pub async fn logout(&self) {
        let mut state = self.state.lock().await;
        if let Err(err) = self.store.clear() {
            warn!("failed to clear credential slot: {err}");
        }
        if state.status != SessionStatus::Anonymous {
            info!("logged out");
        }
        state.token = None;
        state.current_user = None;
        state.status = SessionStatus::Anonymous;
    }

    pub async fn status(&self) -> SessionStatus {
        self.state.lock().await.status
    }

    /// The bearer token, read fresh for each authorized call.
    pub async fn token(&self) -> Option<String> {
        self.state.lock().await.token.clone()
    }

    pub async fn current_user(&self) -> Option<UserRecord> {
        self.state.lock().await.current_user.clone()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        SessionSnapshot {
            status: state.status,
            token: state.token.clone(),
            current_user: state.current_user.clone(),
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
