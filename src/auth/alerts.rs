//! Maps login failures to what the user is shown.

use crate::error::{ApiError, SessionError};

/// Buttons offered with an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertAction {
    Ok,
    TryAgain,
    ResendVerification,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginAlert {
    /// Shown inline under the email field.
    EmailNotFound,
    /// Shown inline under the password field.
    IncorrectPassword,
    RoleDenied,
    NotVerified,
    SessionExpired,
    AccessDenied,
    TooManyAttempts,
    ServerError,
    Offline,
    Connection,
    Failed { message: String },
}

impl LoginAlert {
    pub fn classify(err: &ApiError) -> Self {
        if err.is_transport() {
            return Self::Connection;
        }
        let message = err.server_message().unwrap_or_default();
        match err.status() {
            Some(400) if message.contains("Invalid credentials") => Self::EmailNotFound,
            Some(400) if message.contains("Invalid password") => Self::IncorrectPassword,
            Some(400) if message.contains("Invalid role") => Self::RoleDenied,
            Some(400) if message.contains("User not verified") => Self::NotVerified,
            Some(400) => Self::failed(message, "Invalid login details"),
            Some(401) => Self::SessionExpired,
            Some(403) => Self::AccessDenied,
            Some(429) => Self::TooManyAttempts,
            Some(500) => Self::ServerError,
            _ => Self::failed(message, "An error occurred during login"),
        }
    }

    pub fn from_session_error(err: &SessionError) -> Self {
        match err {
            SessionError::Offline => Self::Offline,
            SessionError::Api(api) => Self::classify(api),
            SessionError::MissingField(_) => Self::Failed {
                message: err.to_string(),
            },
            SessionError::Rejected(message) => Self::failed(message, "Login failed"),
        }
    }

    fn failed(message: &str, fallback: &str) -> Self {
        let message = if message.is_empty() { fallback } else { message };
        Self::Failed {
            message: message.to_string(),
        }
    }

    /// Field the message belongs under, for alerts shown inline.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::EmailNotFound => Some("email"),
            Self::IncorrectPassword => Some("password"),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::EmailNotFound | Self::IncorrectPassword => "Login Failed",
            Self::RoleDenied | Self::Failed { .. } => "Login Failed",
            Self::NotVerified => "Account Not Verified",
            Self::SessionExpired => "Unauthorized",
            Self::AccessDenied => "Access Denied",
            Self::TooManyAttempts => "Too Many Attempts",
            Self::ServerError => "Server Error",
            Self::Offline => "No Internet Connection",
            Self::Connection => "Connection Error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::EmailNotFound => "Email not found",
            Self::IncorrectPassword => "Incorrect password",
            Self::RoleDenied => "You don't have permission to access this role",
            Self::NotVerified => "Please verify your email before logging in",
            Self::SessionExpired => "Your session has expired. Please login again.",
            Self::AccessDenied => "You don't have permission to access this resource",
            Self::TooManyAttempts => "Please try again later",
            Self::ServerError => "Something went wrong on our end. Please try again later.",
            Self::Offline => "Please check your internet connection and try again.",
            Self::Connection => {
                "Unable to connect to the server. Please check your internet connection."
            }
            Self::Failed { message } => message,
        }
    }

    pub fn actions(&self) -> &'static [AlertAction] {
        match self {
            Self::NotVerified => &[AlertAction::Ok, AlertAction::ResendVerification],
            Self::Connection => &[AlertAction::Ok, AlertAction::TryAgain],
            _ => &[AlertAction::Ok],
        }
    }
}

impl std::fmt::Display for LoginAlert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title(), self.message())
    }
}
