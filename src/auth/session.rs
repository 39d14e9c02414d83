//! Session manager — who is signed in, restored across restarts.

use std::sync::Arc;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::auth::{AuthApi, AuthResponse, LoginRequest, SignupRequest, User};
use crate::connectivity::Connectivity;
use crate::error::{ApiError, SessionError};
use crate::store::{SavedCredentials, Storage};

/// Unknown → Checking → Authenticated | Anonymous, re-entered on each start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Unknown,
    Checking,
    Authenticated,
    Anonymous,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::Checking => "checking",
            Self::Authenticated => "authenticated",
            Self::Anonymous => "anonymous",
        };
        write!(f, "{s}")
    }
}

/// Fields for creating an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: SecretString,
    pub firstname: String,
    pub lastname: String,
    pub role: String,
}

struct Inner {
    state: SessionState,
    user: Option<User>,
}

/// Shared authentication context. Hand out clones of an `Arc<SessionManager>`
/// to anything that needs to know who is signed in.
pub struct SessionManager {
    api: Arc<dyn AuthApi>,
    storage: Storage,
    connectivity: Arc<dyn Connectivity>,
    inner: RwLock<Inner>,
}

impl SessionManager {
    pub fn new(
        api: Arc<dyn AuthApi>,
        storage: Storage,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        Self {
            api,
            storage,
            connectivity,
            inner: RwLock::new(Inner {
                state: SessionState::Unknown,
                user: None,
            }),
        }
    }

    pub async fn state(&self) -> SessionState {
        self.inner.read().await.state
    }

    pub async fn user(&self) -> Option<User> {
        self.inner.read().await.user.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state().await == SessionState::Authenticated
    }

    async fn set(&self, state: SessionState, user: Option<User>) {
        let mut inner = self.inner.write().await;
        if inner.state != state {
            debug!(from = %inner.state, to = %state, "Session state changed");
        }
        inner.state = state;
        inner.user = user;
    }

    /// Work out the session on start.
    ///
    /// A pending force-logout marker wins over everything. With remember-me,
    /// a stored user is trusted while the server cannot be reached, and saved
    /// credentials are replayed when the server reports no session. Without
    /// remember-me only the server's answer counts.
    pub async fn restore(&self) -> SessionState {
        self.set(SessionState::Checking, None).await;

        if self.storage.force_logout().await {
            info!("Force-logout marker present, staying signed out");
            self.storage.clear_force_logout().await;
            self.set(SessionState::Anonymous, None).await;
            return SessionState::Anonymous;
        }

        let online = self.connectivity.is_connected();
        let state = if self.storage.remember_me().await {
            self.restore_remembered(online).await
        } else if online {
            self.restore_from_server().await
        } else {
            debug!("Offline without remember-me");
            self.set(SessionState::Anonymous, None).await;
            SessionState::Anonymous
        };

        info!(state = %state, "Session restored");
        state
    }

    async fn restore_remembered(&self, online: bool) -> SessionState {
        // Read before talking to the server: a 401 there wipes both.
        let stored_user: Option<User> = self.storage.user_data().await;
        let credentials = self.storage.credentials().await;

        if !online {
            return self.fallback_to_stored(stored_user).await;
        }

        match self.check_auth().await {
            Ok(Some(user)) => {
                self.storage.save_user_data(&user).await;
                self.set(SessionState::Authenticated, Some(user)).await;
                SessionState::Authenticated
            }
            Ok(None) => match credentials {
                Some(credentials) => self.auto_login(credentials).await,
                None => {
                    self.set(SessionState::Anonymous, None).await;
                    SessionState::Anonymous
                }
            },
            Err(e) => {
                warn!(error = %e, "Could not verify session with server");
                self.fallback_to_stored(stored_user).await
            }
        }
    }

    async fn fallback_to_stored(&self, stored_user: Option<User>) -> SessionState {
        match stored_user {
            Some(user) => {
                self.set(SessionState::Authenticated, Some(user)).await;
                SessionState::Authenticated
            }
            None => {
                self.set(SessionState::Anonymous, None).await;
                SessionState::Anonymous
            }
        }
    }

    async fn auto_login(&self, credentials: SavedCredentials) -> SessionState {
        let SavedCredentials {
            email,
            password,
            role,
        } = credentials;
        match self.authenticate(&email, password, &role, true).await {
            Ok(_) => {
                // the check that led here may have left a marker behind
                self.storage.clear_force_logout().await;
                SessionState::Authenticated
            }
            Err(e) => {
                warn!(email = %email, error = %e, "Auto-login failed");
                self.set(SessionState::Anonymous, None).await;
                SessionState::Anonymous
            }
        }
    }

    async fn restore_from_server(&self) -> SessionState {
        match self.check_auth().await {
            Ok(Some(user)) => {
                self.storage.set_has_seen_onboarding(true).await;
                self.set(SessionState::Authenticated, Some(user)).await;
                SessionState::Authenticated
            }
            Ok(None) => {
                self.set(SessionState::Anonymous, None).await;
                SessionState::Anonymous
            }
            Err(e) => {
                debug!(error = %e, "No active session");
                self.set(SessionState::Anonymous, None).await;
                SessionState::Anonymous
            }
        }
    }

    /// Ask the server who the bearer token belongs to.
    ///
    /// `Ok(None)` means the server answered and there is no session;
    /// `Err` means the server could not be asked.
    pub async fn check_auth(&self) -> Result<Option<User>, ApiError> {
        match self.api.check_auth().await {
            Ok(response) => Ok(response.user),
            Err(ApiError::Rejected { .. } | ApiError::SessionExpired { .. }) => {
                debug!("Auth check: user not authenticated");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Sign in. With `remember_me` the credentials are kept for auto-login;
    /// without it any previously kept credentials are dropped.
    pub async fn login(
        &self,
        email: &str,
        password: SecretString,
        role: &str,
        remember_me: bool,
    ) -> Result<User, SessionError> {
        if !self.connectivity.is_connected() {
            return Err(SessionError::Offline);
        }
        let user = self.authenticate(email, password, role, remember_me).await?;
        self.storage.clear_force_logout().await;
        Ok(user)
    }

    async fn authenticate(
        &self,
        email: &str,
        password: SecretString,
        role: &str,
        remember_me: bool,
    ) -> Result<User, SessionError> {
        use secrecy::ExposeSecret;

        if email.trim().is_empty() {
            return Err(SessionError::MissingField("Email"));
        }
        if password.expose_secret().is_empty() {
            return Err(SessionError::MissingField("Password"));
        }

        let request = LoginRequest {
            email: email.to_string(),
            password: password.clone(),
            role: role.to_string(),
        };
        let response = self.api.login(&request).await.inspect_err(|e| {
            warn!(email = %email, error = %e, "Login failed");
        })?;
        let user = self.accept(response, "Login failed", "/api/auth/login").await?;

        self.storage.save_remember_me(remember_me).await;
        if remember_me {
            self.storage
                .save_credentials(&SavedCredentials {
                    email: email.to_string(),
                    password,
                    role: role.to_string(),
                })
                .await;
        } else {
            self.storage.clear_credentials().await;
        }

        info!(email = %email, remember_me, "Logged in");
        Ok(user)
    }

    /// Create an account and sign straight in.
    pub async fn signup(&self, account: NewAccount) -> Result<User, SessionError> {
        if !self.connectivity.is_connected() {
            return Err(SessionError::Offline);
        }
        let request = SignupRequest {
            email: account.email.clone(),
            password: account.password,
            firstname: account.firstname,
            lastname: account.lastname,
            role: account.role,
        };
        let response = self.api.signup(&request).await.inspect_err(|e| {
            warn!(email = %account.email, error = %e, "Signup failed");
        })?;
        let user = self
            .accept(response, "Signup failed", "/api/auth/signup")
            .await?;
        info!(email = %account.email, "Signed up");
        Ok(user)
    }

    /// Common handling of a login/signup response.
    async fn accept(
        &self,
        response: AuthResponse,
        fallback: &str,
        endpoint: &str,
    ) -> Result<User, SessionError> {
        if !response.success {
            return Err(SessionError::Rejected(
                response.message.unwrap_or_else(|| fallback.to_string()),
            ));
        }
        let user = response.user.ok_or_else(|| ApiError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: "missing user".into(),
        })?;

        if let Some(token) = &response.token {
            self.storage.save_auth_token(token).await;
        }
        self.storage.save_user_data(&user).await;
        self.storage.set_has_seen_onboarding(true).await;
        self.set(SessionState::Authenticated, Some(user.clone()))
            .await;
        Ok(user)
    }

    /// Sign out. The server call is best-effort; locally this always
    /// succeeds. Remember-me keeps the saved credentials and drops only the
    /// token.
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            warn!(error = %e, "Server logout failed, clearing local session anyway");
        }
        if self.storage.remember_me().await {
            self.storage.clear_auth_token().await;
        } else {
            self.storage.clear_all_data().await;
        }
        self.set(SessionState::Anonymous, None).await;
        info!("Logged out");
    }

    /// Let the session react to an error from any authenticated call. The
    /// API client has already wiped storage on a 401; this flips the
    /// in-memory state so screens can send the user to login.
    pub async fn handle_api_error(&self, err: &ApiError) {
        if matches!(err, ApiError::SessionExpired { .. }) {
            warn!("Session expired");
            self.set(SessionState::Anonymous, None).await;
        }
    }
}
