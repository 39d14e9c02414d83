//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Default backend base URL; endpoint paths (`/api/...`) are appended.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Canonical verification-code length used by every OTP flow.
pub const DEFAULT_OTP_LENGTH: usize = 6;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL without a trailing slash.
    pub api_url: String,
    /// Per-request timeout; exceeding it is treated as a network failure.
    pub request_timeout: Duration,
    /// Digits expected in every verification code.
    pub otp_length: usize,
    /// Directory holding the file-backed secure store.
    pub home_dir: PathBuf,
    /// Pause between reaching 100% and routing to the success screen.
    pub completion_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            otp_length: DEFAULT_OTP_LENGTH,
            home_dir: default_home_dir(),
            completion_delay: Duration::from_millis(500),
        }
    }
}

impl ClientConfig {
    /// Build config from environment variables, falling back to defaults for
    /// anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup (used by `from_env` and tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url = lookup("DIETPLAN_API_URL")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.api_url);

        let request_timeout = match lookup("DIETPLAN_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_positive("DIETPLAN_TIMEOUT_SECS", &raw)?),
            None => defaults.request_timeout,
        };

        let otp_length = match lookup("DIETPLAN_OTP_LENGTH") {
            Some(raw) => parse_positive("DIETPLAN_OTP_LENGTH", &raw)? as usize,
            None => defaults.otp_length,
        };

        let home_dir = lookup("DIETPLAN_HOME")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.home_dir);

        let completion_delay = match lookup("DIETPLAN_COMPLETION_DELAY_MS") {
            Some(raw) => {
                let ms = raw.trim().parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                    key: "DIETPLAN_COMPLETION_DELAY_MS".to_string(),
                    message: e.to_string(),
                })?;
                Duration::from_millis(ms)
            }
            None => defaults.completion_delay,
        };

        Ok(Self {
            api_url,
            request_timeout,
            otp_length,
            home_dir,
            completion_delay,
        })
    }

    /// Path of the JSON file backing the secure store.
    pub fn store_path(&self) -> PathBuf {
        self.home_dir.join("secure-store.json")
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must be greater than zero".to_string(),
        }),
        Ok(v) => Ok(v),
        Err(e) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}

fn default_home_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".dietplan")
}
