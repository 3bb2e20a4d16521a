use std::sync::Arc;

use shared::{
    domain::{UserId, UserRecord},
    error::ServiceError,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{flows::EditHandoff, service::DirectoryService, session::SessionManager};

const LOAD_FAILURE_MESSAGE: &str = "failed to load users";
const DELETE_FAILURE_MESSAGE: &str = "failed to delete user";
const NOT_SIGNED_IN_MESSAGE: &str = "not signed in";

#[derive(Debug, Default)]
struct DirectoryState {
    /// Insertion order is the server's response order; replaced wholesale
    /// on a successful load, mutated only by a single-element removal on a
    /// server-acknowledged delete.
    cache: Vec<UserRecord>,
    search: String,
    error: Option<String>,
    notice: Option<String>,
    load_in_flight: bool,
    remove_in_flight: bool,
}

/// How a `remove` trigger resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The server acknowledged the deletion and the cache was updated.
    Removed,
    /// Another removal was already in flight; nothing was sent.
    Busy,
}

/// Locally cached view of the remote user collection.
///
/// The cache becomes authoritative only after server acknowledgment:
/// a delete is never reflected locally before the server confirms it.
pub struct UserDirectoryViewModel {
    api: Arc<dyn DirectoryService>,
    session: Arc<SessionManager>,
    state: Mutex<DirectoryState>,
}

impl UserDirectoryViewModel {
    pub fn new(api: Arc<dyn DirectoryService>, session: Arc<SessionManager>) -> Self {
        Self {
            api,
            session,
            state: Mutex::new(DirectoryState::default()),
        }
    }

    /// Fetches the full collection and replaces the cache wholesale.
    ///
    /// While a load is outstanding further triggers are no-ops, so two
    /// responses can never race and a stale reply cannot clobber a newer
    /// one. On failure the cache keeps its last-known-good contents.
    pub async fn load(&self) -> Result<(), ServiceError> {
        {
            let mut state = self.state.lock().await;
            if state.load_in_flight {
                return Ok(());
            }
            state.load_in_flight = true;
        }

        let Some(token) = self.session.token().await else {
            let mut state = self.state.lock().await;
            state.load_in_flight = false;
            state.error = Some(NOT_SIGNED_IN_MESSAGE.to_string());
            return Err(ServiceError::Unauthorized {
                message: NOT_SIGNED_IN_MESSAGE.to_string(),
            });
        };

        let result = self.api.list_users(&token).await;

        let mut state = self.state.lock().await;
        state.load_in_flight = false;
        match result {
            Ok(users) => {
                state.cache = users;
                state.error = None;
                Ok(())
            }
            Err(err) => {
                warn!("user list load failed: {err}");
                state.error = Some(LOAD_FAILURE_MESSAGE.to_string());
                Err(err)
            }
        }
    }

    /// Stores the search query. Pure local state, no network call.
    pub async fn set_search(&self, query: impl Into<String>) {
        self.state.lock().await.search = query.into();
    }

    /// The cache filtered by the current query: case-insensitive substring
    /// match on username or full name, in cache order. An empty query
    /// returns the cache unchanged.
    pub async fn filtered_view(&self) -> Vec<UserRecord> {
        let state = self.state.lock().await;
        state
            .cache
            .iter()
            .filter(|user| user.matches_query(&state.search))
            .cloned()
            .collect()
    }

    /// Deletes `id` on the server, then removes it from the cache.
    ///
    /// Only ever invoked behind [`crate::DeleteConfirmation`]: the caller
    /// must have gathered explicit confirmation first. No optimistic local
    /// mutation: the cache changes strictly after the server acknowledges,
    /// and not at all on failure. A trigger arriving while another removal
    /// is outstanding sends nothing and reports [`RemoveOutcome::Busy`]
    /// rather than a success.
    pub async fn remove(&self, id: UserId) -> Result<RemoveOutcome, ServiceError> {
        {
            let mut state = self.state.lock().await;
            if state.remove_in_flight {
                return Ok(RemoveOutcome::Busy);
            }
            state.remove_in_flight = true;
        }

        let Some(token) = self.session.token().await else {
            let mut state = self.state.lock().await;
            state.remove_in_flight = false;
            state.error = Some(NOT_SIGNED_IN_MESSAGE.to_string());
            return Err(ServiceError::Unauthorized {
                message: NOT_SIGNED_IN_MESSAGE.to_string(),
            });
        };

        let result = self.api.delete_user(&token, id).await;

        let mut state = self.state.lock().await;
        state.remove_in_flight = false;
        match result {
            Ok(()) => {
                state.error = None;
                match state.cache.iter().position(|user| user.id == id) {
                    Some(index) => {
                        let removed = state.cache.remove(index);
                        info!(username = %removed.username, "user deleted");
                        state.notice = Some(format!("user '{}' deleted", removed.username));
                    }
                    None => {
                        state.notice = Some("user deleted".to_string());
                    }
                }
                Ok(RemoveOutcome::Removed)
            }
            Err(err) => {
                warn!("user delete failed: {err}");
                state.notice = None;
                state.error = Some(DELETE_FAILURE_MESSAGE.to_string());
                Err(err)
            }
        }
    }

    /// Produces the one-shot hand-off that carries a cached record into
    /// the update view. No mutation, no network call.
    pub async fn request_edit(&self, id: UserId) -> Option<EditHandoff> {
        let state = self.state.lock().await;
        state
            .cache
            .iter()
            .find(|user| user.id == id)
            .cloned()
            .map(|record| EditHandoff { record })
    }

    /// The unfiltered cache, in server order.
    pub async fn users(&self) -> Vec<UserRecord> {
        self.state.lock().await.cache.clone()
    }

    /// Last failure message, if the most recent operation failed.
    pub async fn error_message(&self) -> Option<String> {
        self.state.lock().await.error.clone()
    }

    /// Last success message (e.g. naming a deleted user).
    pub async fn notice(&self) -> Option<String> {
        self.state.lock().await.notice.clone()
    }
}

#[cfg(test)]
#[path = "tests/directory_tests.rs"]
mod tests;
