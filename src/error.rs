//! Error types for the diet-plan client.

use std::time::Duration;

use crate::forms::StepRejection;

/// Top-level error type for the client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),

    #[error("Submission error: {0}")]
    Submission(#[from] SubmissionError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Secure key-value storage errors.
///
/// Callers going through `store::Storage` never see these: failures are
/// logged there and reads degrade to "absent".
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to read key {key}: {reason}")]
    Read { key: String, reason: String },

    #[error("Failed to write key {key}: {reason}")]
    Write { key: String, reason: String },

    #[error("Failed to delete key {key}: {reason}")]
    Delete { key: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Remote backend errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No response was received at all.
    #[error("Network error. Please check your internet connection. ({reason})")]
    Network { reason: String },

    /// The request exceeded the client timeout.
    #[error("Request timeout. Server took too long to respond. (after {timeout:?})")]
    Timeout { timeout: Duration },

    /// The server answered with a non-success status.
    #[error("Server rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// A 401 on any call; local session data has been wiped.
    #[error("Session expired: {message}")]
    SessionExpired { message: String },

    /// The server answered 2xx but the body did not match the expected shape.
    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

impl ApiError {
    /// Whether this is a transport failure (no usable response) rather than
    /// a server rejection.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout { .. })
    }

    /// HTTP-like status for this error: transport failures report 0 or 408.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Network { .. } => Some(0),
            Self::Timeout { .. } => Some(408),
            Self::Rejected { status, .. } => Some(*status),
            Self::SessionExpired { .. } => Some(401),
            Self::InvalidResponse { .. } => None,
        }
    }

    /// Server-supplied message, if the server supplied one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } | Self::SessionExpired { message } => Some(message),
            _ => None,
        }
    }
}

/// Wizard accumulation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WizardError {
    #[error("Cannot apply {step} while the wizard is at {current}")]
    OutOfOrder { step: String, current: String },

    #[error("Profile is incomplete: missing {0}")]
    Incomplete(String),

    #[error("Invalid {field}: {reason}")]
    Invalid { field: String, reason: String },

    #[error("Invalid route parameter {key}: {reason}")]
    RouteParam { key: String, reason: String },
}

/// Submission orchestrator errors.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Submission already started (phase: {phase})")]
    AlreadyStarted { phase: String },

    #[error("Plan creation failed: {0}")]
    CreatePlan(#[source] ApiError),

    #[error("Profile persistence failed: {0}")]
    PersistProfile(#[source] ApiError),

    #[error("Submission cancelled")]
    Cancelled,
}

/// Session / authentication errors surfaced by the session manager.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No Internet Connection. Please check your internet connection and try again.")]
    Offline,

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors from the signup and password-reset flows.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// Local validation refused the step; nothing was sent.
    #[error(transparent)]
    Invalid(#[from] StepRejection),

    #[error("An account already exists for {0}")]
    AlreadyRegistered(String),

    #[error("{step} is not available at {current}")]
    OutOfOrder {
        step: &'static str,
        current: &'static str,
    },

    /// The server answered 2xx with `success: false`.
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Result type alias for the client.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_are_distinguished_from_rejections() {
        let net = ApiError::Network {
            reason: "connection refused".into(),
        };
        let timeout = ApiError::Timeout {
            timeout: Duration::from_secs(10),
        };
        let rejected = ApiError::Rejected {
            status: 400,
            message: "Invalid credentials".into(),
        };

        assert!(net.is_transport());
        assert!(timeout.is_transport());
        assert!(!rejected.is_transport());

        assert_eq!(net.status(), Some(0));
        assert_eq!(timeout.status(), Some(408));
        assert_eq!(rejected.status(), Some(400));
        assert_eq!(rejected.server_message(), Some("Invalid credentials"));
        assert_eq!(net.server_message(), None);
    }

    #[test]
    fn messages_match_user_facing_wording() {
        let timeout = ApiError::Timeout {
            timeout: Duration::from_secs(10),
        };
        assert!(timeout.to_string().starts_with("Request timeout."));

        let offline = SessionError::Offline;
        assert!(offline.to_string().contains("No Internet Connection"));
    }
}
