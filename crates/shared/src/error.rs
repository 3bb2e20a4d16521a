use thiserror::Error;

/// Failure of a call against the remote directory service.
///
/// `Unauthorized` is kept distinguishable from other server failures so
/// callers can decide whether a rejected token should end the session;
/// nothing in this crate forces that decision.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },
    #[error("request rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("network failure: {0}")]
    Network(String),
}

impl ServiceError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// The user-facing message carried by this failure.
    pub fn message(&self) -> &str {
        match self {
            Self::Unauthorized { message } | Self::Rejected { message, .. } => message,
            Self::Network(message) => message,
        }
    }
}

/// Client-side input rejection. Detected before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("email format is invalid")]
    InvalidEmail,
    #[error("username must be 3-50 characters of letters, digits or underscores")]
    InvalidUsername,
    #[error("password must be at least 8 characters with an uppercase, a lowercase, a digit and a symbol")]
    WeakPassword,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_is_distinguishable() {
        let err = ServiceError::Unauthorized {
            message: "token expired".into(),
        };
        assert!(err.is_unauthorized());
        assert_eq!(err.message(), "token expired");

        let err = ServiceError::Rejected {
            status: 500,
            message: "boom".into(),
        };
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn validation_errors_render_field_names() {
        assert_eq!(
            ValidationError::MissingField("username").to_string(),
            "username is required"
        );
    }
}
