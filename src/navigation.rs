//! Screen navigation capability.
//!
//! Screens never know how they are displayed; they push a `Route` and the
//! host decides what that means.

use std::sync::Mutex;

use crate::profile::wizard::{RouteParams, WizardStep};

/// Where a finished submission lands.
#[derive(Debug, Clone, PartialEq)]
pub enum Terminal {
    /// The plan was created and the profile persisted.
    Success { email: String },
    /// Either call failed; the screen offers a retry.
    Failure { email: String, reason: String },
}

/// A screen plus the parameters it is opened with.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Login,
    Home,
    SignupDetails { email: String },
    VerifyEmail { email: String },
    ResetVerify { email: String },
    ResetNewPassword { email: String },
    Wizard { step: WizardStep, params: RouteParams },
    Terminal(Terminal),
}

impl Route {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Home => "home",
            Self::SignupDetails { .. } => "signup_details",
            Self::VerifyEmail { .. } => "verify_email",
            Self::ResetVerify { .. } => "reset_verify",
            Self::ResetNewPassword { .. } => "reset_new_password",
            Self::Wizard { .. } => "wizard",
            Self::Terminal(Terminal::Success { .. }) => "plan_ready",
            Self::Terminal(Terminal::Failure { .. }) => "plan_failed",
        }
    }
}

/// "Push screen with parameters".
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Navigator that only remembers where it was sent.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<Route> {
        self.history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<Route> {
        self.history.lock().ok().and_then(|h| h.last().cloned())
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        tracing::debug!(route = route.name(), "Navigate");
        if let Ok(mut history) = self.history.lock() {
            history.push(route);
        }
    }
}
