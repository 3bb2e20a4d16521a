pub mod directory;
pub mod flows;
pub mod guard;
pub mod service;
pub mod session;

pub use directory::{RemoveOutcome, UserDirectoryViewModel};
pub use flows::{
    DeleteConfirmation, EditHandoff, RedirectToDirectory, RegisterFlow, SubmitError,
    UpdateRecordFlow, SUCCESS_REDIRECT_DELAY,
};
pub use guard::{GateDecision, ProtectedAccessGate, LOGIN_ROUTE};
pub use service::{DirectoryService, HttpDirectoryService, DEFAULT_REQUEST_TIMEOUT};
pub use session::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore, PersistedCredential,
    SessionManager, SessionSnapshot, SessionStatus,
};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
