//! `/api/auth/*` endpoints.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ApiError;

use super::ApiClient;

/// Role sent with login and signup when the caller does not pick one.
pub const DEFAULT_ROLE: &str = "user";

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CodeRequest {
    pub code: String,
}

/// `SecretString` keeps the password out of `Debug` output.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
    pub role: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub email: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
    pub firstname: String,
    pub lastname: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
    #[serde(serialize_with = "expose")]
    pub confirm_password: SecretString,
}

/// Account as returned by login, signup and check-auth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, rename = "isVerified", skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
    /// Any other fields the backend includes.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.firstname.as_deref().unwrap_or(&self.email)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckAuthResponse {
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckEmailResponse {
    #[serde(rename = "isRegistered", default)]
    pub is_registered: bool,
}

/// Generic `{ success, message }` acknowledgement.
#[derive(Debug, Clone, Deserialize)]
pub struct AckResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl AckResponse {
    pub fn message_or(&self, fallback: &str) -> String {
        self.message.clone().unwrap_or_else(|| fallback.to_string())
    }
}

/// Authentication endpoints.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn check_email(&self, email: &str) -> Result<CheckEmailResponse, ApiError>;
    async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, ApiError>;
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError>;
    async fn logout(&self) -> Result<AckResponse, ApiError>;
    async fn check_auth(&self) -> Result<CheckAuthResponse, ApiError>;
    async fn verify_email(&self, code: &str) -> Result<AckResponse, ApiError>;
    async fn send_verification_token(&self, email: &str) -> Result<AckResponse, ApiError>;
    async fn verify_reset_code(&self, code: &str) -> Result<AckResponse, ApiError>;
    async fn reset_password(&self, request: &ResetPasswordRequest)
    -> Result<AckResponse, ApiError>;
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn check_email(&self, email: &str) -> Result<CheckEmailResponse, ApiError> {
        let body = EmailRequest {
            email: email.to_string(),
        };
        self.post(&["api", "auth", "check-email"], &body).await
    }

    async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, ApiError> {
        self.post(&["api", "auth", "signup"], request).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.post(&["api", "auth", "login"], request).await
    }

    async fn logout(&self) -> Result<AckResponse, ApiError> {
        self.post(&["api", "auth", "logout"], &serde_json::json!({}))
            .await
    }

    async fn check_auth(&self) -> Result<CheckAuthResponse, ApiError> {
        self.get(&["api", "auth", "check-auth"]).await
    }

    async fn verify_email(&self, code: &str) -> Result<AckResponse, ApiError> {
        let body = CodeRequest {
            code: code.to_string(),
        };
        self.post(&["api", "auth", "verify-email"], &body).await
    }

    async fn send_verification_token(&self, email: &str) -> Result<AckResponse, ApiError> {
        let body = EmailRequest {
            email: email.to_string(),
        };
        self.post(&["api", "auth", "send-verification-token-mobile"], &body)
            .await
    }

    async fn verify_reset_code(&self, code: &str) -> Result<AckResponse, ApiError> {
        let body = CodeRequest {
            code: code.to_string(),
        };
        self.post(&["api", "auth", "verify-email-mobile"], &body).await
    }

    async fn reset_password(
        &self,
        request: &ResetPasswordRequest,
    ) -> Result<AckResponse, ApiError> {
        self.post(&["api", "auth", "reset-password-mobile"], request)
            .await
    }
}
