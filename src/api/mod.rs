//! HTTP client for the diet-plan backend.
//!
//! Every request reads the bearer token fresh from storage. A 401 from any
//! endpoint wipes the local session and leaves a force-logout marker for the
//! next start.

pub mod auth;
pub mod dietplan;
pub mod user;

use std::time::Duration;

use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::store::Storage;

pub use auth::{
    AckResponse, AuthApi, AuthResponse, CheckEmailResponse, LoginRequest, SignupRequest, User,
};
pub use dietplan::{DietPlan, DietPlanApi, MealItem, PlanRequest, PlanResponse};
pub use user::{ProfileRecord, UserApi};

/// reqwest-backed implementation of every backend capability.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    storage: Storage,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, storage: Storage) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.api_url).map_err(|e| ApiError::InvalidResponse {
            endpoint: config.api_url.clone(),
            reason: format!("invalid base URL: {e}"),
        })?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Network {
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url,
            timeout: config.request_timeout,
            storage,
        })
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidResponse {
                endpoint: self.base_url.to_string(),
                reason: "base URL cannot carry a path".into(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) async fn get<T>(&self, segments: &[&str]) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        self.send::<(), T>(Method::GET, segments, None).await
    }

    pub(crate) async fn post<B, T>(&self, segments: &[&str], body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::POST, segments, Some(body)).await
    }

    pub(crate) async fn put<B, T>(&self, segments: &[&str], body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::PUT, segments, Some(body)).await
    }

    async fn send<B, T>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        let endpoint = url.path().to_string();

        let mut request = self.http.request(method.clone(), url);
        if let Some(token) = self.storage.auth_token().await {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(method = %method, endpoint = %endpoint, "API request");

        let response = request.send().await.map_err(|e| self.transport_error(&endpoint, e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(&endpoint, e))?;

        if status == StatusCode::UNAUTHORIZED {
            let message = server_message(&text).unwrap_or_else(|| "Unauthorized".to_string());
            tracing::warn!(endpoint = %endpoint, "401 received, clearing local session");
            self.storage.clear_all_data().await;
            self.storage.set_force_logout().await;
            return Err(ApiError::SessionExpired { message });
        }

        if !status.is_success() {
            let message = server_message(&text).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });
            tracing::warn!(
                endpoint = %endpoint,
                status = status.as_u16(),
                message = %message,
                "API request rejected"
            );
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::warn!(endpoint = %endpoint, error = %e, "Unexpected response body");
            ApiError::InvalidResponse {
                endpoint,
                reason: e.to_string(),
            }
        })
    }

    fn transport_error(&self, endpoint: &str, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            tracing::warn!(endpoint, timeout = ?self.timeout, "API request timed out");
            ApiError::Timeout {
                timeout: self.timeout,
            }
        } else {
            tracing::warn!(endpoint, error = %err, "API request failed without a response");
            ApiError::Network {
                reason: err.to_string(),
            }
        }
    }
}

/// `message` (or `error`) field of a JSON error body.
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(key)?.as_str())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}
