use std::time::Duration;

use shared::{
    domain::{UserId, UserRecord},
    error::{ServiceError, ValidationError},
    protocol::{RegisterRequest, UpdateUserRequest},
};
use thiserror::Error;
use tracing::info;

use crate::{directory::UserDirectoryViewModel, service::DirectoryService, session::SessionManager};

/// How long a success message stays visible before the caller navigates
/// back to the directory view.
pub const SUCCESS_REDIRECT_DELAY: Duration = Duration::from_millis(1500);

/// One-shot transfer of a selected record from the directory view into the
/// update view. Consumed exactly once, never persisted.
#[derive(Debug, Clone)]
pub struct EditHandoff {
    pub record: UserRecord,
}

/// Navigation effect: the routing layer must send the user back to the
/// directory view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedirectToDirectory;

/// Submission failure of the update and register flows.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Two-step gate in front of the destructive delete mutation.
///
/// There is no "visible without a target" state: a pending confirmation
/// always carries the record it would delete.
#[derive(Debug, Clone, Default)]
pub enum DeleteConfirmation {
    #[default]
    Idle,
    PendingConfirmation { target: UserRecord },
}

impl DeleteConfirmation {
    /// Arms the gate. Selecting while already pending overwrites the
    /// target; there is at most one pending target at a time.
    pub fn select_for_deletion(&mut self, record: UserRecord) {
        *self = Self::PendingConfirmation { target: record };
    }

    /// Disarms the gate without any mutation.
    pub fn cancel(&mut self) {
        *self = Self::Idle;
    }

    pub fn pending_target(&self) -> Option<&UserRecord> {
        match self {
            Self::PendingConfirmation { target } => Some(target),
            Self::Idle => None,
        }
    }

    /// Dispatches the armed deletion exactly once and returns to `Idle`
    /// regardless of the mutation's outcome. The outcome itself is
    /// surfaced through the view model's messages, not by this flow.
    pub async fn confirm(&mut self, directory: &UserDirectoryViewModel) {
        let target = match std::mem::take(self) {
            Self::PendingConfirmation { target } => target,
            Self::Idle => return,
        };
        let _ = directory.remove(target.id).await;
    }
}

/// Editable copy of a handed-off record. The id is retained but never
/// editable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRecordFlow {
    id: UserId,
    pub username: String,
    pub full_name: String,
    pub email: String,
}

impl UpdateRecordFlow {
    /// Entry guard: direct navigation without a hand-off redirects back to
    /// the directory view with zero network calls.
    pub fn enter(handoff: Option<EditHandoff>) -> Result<Self, RedirectToDirectory> {
        let Some(EditHandoff { record }) = handoff else {
            info!("update view entered without hand-off, redirecting");
            return Err(RedirectToDirectory);
        };
        Ok(Self {
            id: record.id,
            username: record.username,
            full_name: record.full_name,
            email: record.email,
        })
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    fn validate(&self) -> Result<UpdateUserRequest, ValidationError> {
        let username = required(&self.username, "username")?;
        let full_name = required(&self.full_name, "full name")?;
        let email = required(&self.email, "email")?;
        if !is_valid_username(&username) {
            return Err(ValidationError::InvalidUsername);
        }
        if !is_valid_email(&email) {
            return Err(ValidationError::InvalidEmail);
        }
        Ok(UpdateUserRequest {
            username,
            full_name,
            email,
        })
    }

    /// Issues the authorized update keyed by the original id.
    ///
    /// Validation failures block the network call. On a service failure the
    /// local edits are kept so the user can retry. On success the caller
    /// shows its message for [`SUCCESS_REDIRECT_DELAY`] and then navigates
    /// back.
    pub async fn submit(
        &self,
        api: &dyn DirectoryService,
        session: &SessionManager,
    ) -> Result<(), SubmitError> {
        let request = self.validate()?;
        let Some(token) = session.token().await else {
            return Err(SubmitError::Service(ServiceError::Unauthorized {
                message: "not signed in".to_string(),
            }));
        };
        api.update_user(&token, self.id, &request).await?;
        info!(username = %request.username, "user updated");
        Ok(())
    }

    /// Discards the local edits. Never issues a network call.
    pub fn cancel(self) -> RedirectToDirectory {
        RedirectToDirectory
    }
}

/// Account creation form. Unauthenticated; validated client-side before
/// any network call.
#[derive(Debug, Clone, Default)]
pub struct RegisterFlow {
    pub username: String,
    pub password: String,
    pub email: String,
    pub full_name: String,
}

impl RegisterFlow {
    fn validate(&self) -> Result<RegisterRequest, ValidationError> {
        let full_name = required(&self.full_name, "full name")?;
        let email = required(&self.email, "email")?;
        let username = required(&self.username, "username")?;
        if self.password.is_empty() {
            return Err(ValidationError::MissingField("password"));
        }
        if !is_valid_email(&email) {
            return Err(ValidationError::InvalidEmail);
        }
        if !is_valid_username(&username) {
            return Err(ValidationError::InvalidUsername);
        }
        if !is_strong_password(&self.password) {
            return Err(ValidationError::WeakPassword);
        }
        Ok(RegisterRequest {
            username,
            password: self.password.clone(),
            email,
            full_name,
        })
    }

    pub async fn submit(&self, api: &dyn DirectoryService) -> Result<(), SubmitError> {
        let request = self.validate()?;
        api.register(&request).await?;
        info!(username = %request.username, "user registered");
        Ok(())
    }
}

fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(value.to_string())
}

/// Same shape the service enforces: `local@domain`, no whitespace, with a
/// dot strictly inside the domain part.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() || domain.len() < 3 {
        return false;
    }
    domain
        .char_indices()
        .any(|(index, c)| c == '.' && index > 0 && index < domain.len() - 1)
}

/// 3-50 characters, letters, digits and underscores only.
fn is_valid_username(username: &str) -> bool {
    (3..=50).contains(&username.len())
        && username
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

const PASSWORD_SYMBOLS: &str = "!@#$%^&*(),.?\":{}|<>";

/// At least 8 characters with an uppercase, a lowercase, a digit and a
/// symbol from the set the service accepts.
fn is_strong_password(password: &str) -> bool {
    password.len() >= 8
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SYMBOLS.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::UserId;

    fn record(id: i64, username: &str) -> UserRecord {
        UserRecord {
            id: UserId(id),
            username: username.to_string(),
            full_name: format!("{username} full"),
            email: format!("{username}@example.com"),
        }
    }

    #[test]
    fn second_selection_overwrites_pending_target() {
        let mut flow = DeleteConfirmation::default();
        assert!(flow.pending_target().is_none());

        flow.select_for_deletion(record(1, "alice"));
        flow.select_for_deletion(record(2, "bob"));
        assert_eq!(flow.pending_target().map(|u| u.id), Some(UserId(2)));
    }

    #[test]
    fn cancel_returns_to_idle() {
        let mut flow = DeleteConfirmation::default();
        flow.select_for_deletion(record(1, "alice"));
        flow.cancel();
        assert!(flow.pending_target().is_none());
    }

    #[test]
    fn entering_update_without_handoff_redirects() {
        assert_eq!(UpdateRecordFlow::enter(None), Err(RedirectToDirectory));
    }

    #[test]
    fn update_flow_seeds_fields_and_keeps_id_immutable() {
        let flow = UpdateRecordFlow::enter(Some(EditHandoff {
            record: record(7, "alice"),
        }))
        .expect("enter with hand-off");
        assert_eq!(flow.id(), UserId(7));
        assert_eq!(flow.username, "alice");
        assert_eq!(flow.full_name, "alice full");
        assert_eq!(flow.email, "alice@example.com");
    }

    #[test]
    fn update_validation_rejects_missing_and_malformed_fields() {
        let mut flow = UpdateRecordFlow::enter(Some(EditHandoff {
            record: record(7, "alice"),
        }))
        .expect("enter");

        flow.email = "  ".to_string();
        assert_eq!(flow.validate(), Err(ValidationError::MissingField("email")));

        flow.email = "not-an-email".to_string();
        assert_eq!(flow.validate(), Err(ValidationError::InvalidEmail));

        flow.email = "a@b.co".to_string();
        flow.username = "x".to_string();
        assert_eq!(flow.validate(), Err(ValidationError::InvalidUsername));
    }

    #[test]
    fn register_validation_matches_service_rules() {
        let valid = RegisterFlow {
            username: "new_user".into(),
            password: "Sup3rSecret!".into(),
            email: "new@site.io".into(),
            full_name: "New User".into(),
        };
        assert!(valid.validate().is_ok());

        let mut missing = valid.clone();
        missing.full_name.clear();
        assert_eq!(
            missing.validate(),
            Err(ValidationError::MissingField("full name"))
        );

        let mut weak = valid.clone();
        weak.password = "alllowercase1!".into();
        assert_eq!(weak.validate(), Err(ValidationError::WeakPassword));

        let mut bad_email = valid;
        bad_email.email = "new@site".into();
        assert_eq!(bad_email.validate(), Err(ValidationError::InvalidEmail));
    }

    #[test]
    fn password_strength_requires_a_symbol() {
        assert!(is_strong_password("Sup3rSecret!"));
        assert!(is_strong_password("Pa55word?"));
        // Mixed case and digit alone are not enough.
        assert!(!is_strong_password("Sup3rSecret"));
        assert!(!is_strong_password("Short1!"));
        assert!(!is_strong_password("nosymbol1A"));
    }

    #[test]
    fn email_shape_edge_cases() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a@.co"));
        assert!(!is_valid_email("a@co."));
        assert!(!is_valid_email("a b@c.co"));
        assert!(!is_valid_email("a@b@c.co"));
        assert!(!is_valid_email("@b.co"));
    }

    #[test]
    fn register_request_uses_trimmed_fields() {
        let flow = RegisterFlow {
            username: "  new_user  ".into(),
            password: "Sup3rSecret!".into(),
            email: " new@site.io ".into(),
            full_name: " New User ".into(),
        };
        let request = flow.validate().expect("valid");
        assert_eq!(request.username, "new_user");
        assert_eq!(request.email, "new@site.io");
        assert_eq!(request.full_name, "New User");
    }
}
