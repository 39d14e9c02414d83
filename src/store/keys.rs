//! Key names used in the secure store.

/// Legacy token key, cleared alongside `AUTH_TOKEN`.
pub const TOKEN: &str = "token";
/// Bearer token attached to outgoing requests.
pub const AUTH_TOKEN: &str = "authToken";
/// JSON-serialized user record returned by login/signup/check-auth.
pub const USER_DATA: &str = "userData";
/// `"true"` / `"false"`.
pub const REMEMBER_ME: &str = "rememberMe";
/// JSON `{email,password,role}` kept for remember-me auto-login.
pub const USER_CREDENTIALS: &str = "userCredentials";
/// `"true"` once the intro screens have been shown.
pub const HAS_SEEN_ONBOARDING: &str = "hasSeenOnboarding";
/// Email captured at the first password-reset step.
pub const RESET_EMAIL: &str = "resetEmail";
/// Code accepted at the password-reset verification step.
pub const VERIFICATION_CODE: &str = "verificationCode";
/// `"true"` after a 401 wiped the session; consumed by the next restore.
pub const FORCE_LOGOUT: &str = "forceLogout";

/// Keys removed by `Storage::clear_all_data`.
pub const SESSION_KEYS: &[&str] = &[TOKEN, USER_DATA, AUTH_TOKEN, REMEMBER_ME, USER_CREDENTIALS];
