//! Typed helpers over a `SecureStore`.
//!
//! Every helper swallows backend failures: the error is logged and reads
//! report the value as absent, writes report `false`.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::keys;
use super::traits::SecureStore;

/// Credentials kept for remember-me auto-login.
#[derive(Debug, Clone)]
pub struct SavedCredentials {
    pub email: String,
    pub password: SecretString,
    pub role: String,
}

#[derive(Serialize, Deserialize)]
struct CredentialsRecord {
    email: String,
    password: String,
    role: String,
}

/// Shared handle to the secure store with typed accessors.
#[derive(Clone)]
pub struct Storage {
    store: Arc<dyn SecureStore>,
}

impl Storage {
    pub fn new(store: Arc<dyn SecureStore>) -> Self {
        Self { store }
    }

    /// Raw read. Failures are logged and reported as absent.
    pub async fn get(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Secure store read failed");
                None
            }
        }
    }

    /// Raw write. Returns whether the write succeeded.
    pub async fn set(&self, key: &str, value: &str) -> bool {
        match self.store.set(key, value).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "Secure store write failed");
                false
            }
        }
    }

    /// Raw delete. Returns whether the delete succeeded.
    pub async fn remove(&self, key: &str) -> bool {
        match self.store.delete(key).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "Secure store delete failed");
                false
            }
        }
    }

    async fn get_flag(&self, key: &str) -> bool {
        self.get(key).await.as_deref() == Some("true")
    }

    async fn set_flag(&self, key: &str, value: bool) -> bool {
        self.set(key, if value { "true" } else { "false" }).await
    }

    // ── Token ───────────────────────────────────────────────────────

    pub async fn auth_token(&self) -> Option<String> {
        self.get(keys::AUTH_TOKEN).await.filter(|t| !t.is_empty())
    }

    pub async fn save_auth_token(&self, token: &str) -> bool {
        if token.is_empty() {
            tracing::warn!("Attempted to save empty token");
            return false;
        }
        self.set(keys::AUTH_TOKEN, token).await
    }

    pub async fn clear_auth_token(&self) -> bool {
        self.remove(keys::AUTH_TOKEN).await
    }

    // ── User data ───────────────────────────────────────────────────

    pub async fn save_user_data<T: Serialize>(&self, user: &T) -> bool {
        match serde_json::to_string(user) {
            Ok(json) => self.set(keys::USER_DATA, &json).await,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize user data");
                false
            }
        }
    }

    pub async fn user_data<T: DeserializeOwned>(&self) -> Option<T> {
        let raw = self.get(keys::USER_DATA).await?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "Stored user data is not valid JSON");
                None
            }
        }
    }

    // ── Remember me ─────────────────────────────────────────────────

    pub async fn remember_me(&self) -> bool {
        self.get_flag(keys::REMEMBER_ME).await
    }

    pub async fn save_remember_me(&self, value: bool) -> bool {
        self.set_flag(keys::REMEMBER_ME, value).await
    }

    pub async fn save_credentials(&self, credentials: &SavedCredentials) -> bool {
        let record = CredentialsRecord {
            email: credentials.email.clone(),
            password: credentials.password.expose_secret().to_string(),
            role: credentials.role.clone(),
        };
        match serde_json::to_string(&record) {
            Ok(json) => self.set(keys::USER_CREDENTIALS, &json).await,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize credentials");
                false
            }
        }
    }

    pub async fn credentials(&self) -> Option<SavedCredentials> {
        let raw = self.get(keys::USER_CREDENTIALS).await?;
        match serde_json::from_str::<CredentialsRecord>(&raw) {
            Ok(record) => Some(SavedCredentials {
                email: record.email,
                password: SecretString::from(record.password),
                role: record.role,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Stored credentials are not valid JSON");
                None
            }
        }
    }

    pub async fn clear_credentials(&self) -> bool {
        self.remove(keys::USER_CREDENTIALS).await
    }

    // ── Flags ───────────────────────────────────────────────────────

    pub async fn has_seen_onboarding(&self) -> bool {
        self.get_flag(keys::HAS_SEEN_ONBOARDING).await
    }

    pub async fn set_has_seen_onboarding(&self, value: bool) -> bool {
        self.set_flag(keys::HAS_SEEN_ONBOARDING, value).await
    }

    pub async fn force_logout(&self) -> bool {
        self.get_flag(keys::FORCE_LOGOUT).await
    }

    pub async fn set_force_logout(&self) -> bool {
        self.set_flag(keys::FORCE_LOGOUT, true).await
    }

    pub async fn clear_force_logout(&self) -> bool {
        self.remove(keys::FORCE_LOGOUT).await
    }

    // ── Wipe ────────────────────────────────────────────────────────

    /// Remove every session key while keeping the onboarding flag.
    pub async fn clear_all_data(&self) -> bool {
        let seen = self.has_seen_onboarding().await;

        let mut ok = true;
        for key in keys::SESSION_KEYS {
            ok &= self.remove(key).await;
        }

        if seen {
            ok &= self.set_has_seen_onboarding(true).await;
        }
        if !ok {
            tracing::warn!("Clearing local data was only partially successful");
        }
        ok
    }
}
