use std::sync::Arc;

use crate::session::{SessionManager, SessionStatus};

/// Login entry point every blocked protected view redirects to.
pub const LOGIN_ROUTE: &str = "/login";

/// What the rendering layer must do with a protected view right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Session still initializing: render a placeholder, mount nothing.
    Loading,
    /// Anonymous: redirect to [`LOGIN_ROUTE`], replacing history so
    /// back-navigation cannot return to the protected view.
    RedirectToLogin,
    /// Authenticated: mount the wrapped view.
    Allow,
}

/// Guard in front of every protected view.
///
/// Not a terminal state machine: the decision must be re-evaluated on
/// every session transition for the lifetime of the gate.
pub struct ProtectedAccessGate {
    session: Arc<SessionManager>,
}

impl ProtectedAccessGate {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    pub async fn decide(&self) -> GateDecision {
        evaluate(self.session.status().await)
    }
}

pub fn evaluate(status: SessionStatus) -> GateDecision {
    match status {
        SessionStatus::Initializing => GateDecision::Loading,
        SessionStatus::Anonymous => GateDecision::RedirectToLogin,
        SessionStatus::Authenticated => GateDecision::Allow,
    }
}
