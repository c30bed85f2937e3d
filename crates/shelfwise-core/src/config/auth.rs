//! Token and credential configuration.

use serde::{Deserialize, Serialize};

/// Access/refresh token and password policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for access-token signing (HMAC-SHA256).
    ///
    /// Process-wide; rotating it invalidates all outstanding access tokens
    /// but never affects refresh tokens.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_minutes: u64,
    /// Refresh token TTL in days.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_days: u64,
    /// Email verification token TTL in hours.
    #[serde(default = "default_verification_ttl")]
    pub verification_token_ttl_hours: u64,
    /// Password reset token TTL in hours.
    #[serde(default = "default_reset_ttl")]
    pub reset_token_ttl_hours: u64,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Whether login is refused until the email address is verified.
    #[serde(default)]
    pub require_verified_login: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            access_token_ttl_minutes: default_access_ttl(),
            refresh_token_ttl_days: default_refresh_ttl(),
            verification_token_ttl_hours: default_verification_ttl(),
            reset_token_ttl_hours: default_reset_ttl(),
            password_min_length: default_password_min(),
            require_verified_login: false,
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_access_ttl() -> u64 {
    30
}

fn default_refresh_ttl() -> u64 {
    7
}

fn default_verification_ttl() -> u64 {
    24
}

fn default_reset_ttl() -> u64 {
    1
}

fn default_password_min() -> usize {
    8
}
