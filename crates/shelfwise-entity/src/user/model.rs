//! User entity model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::UserRole;

/// A registered user of the Shelfwise platform.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Unique login name.
    pub username: String,
    /// Unique email address, stored lower-cased.
    pub email: String,
    /// Argon2id password hash. `None` for OAuth-only accounts.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// User role (RBAC).
    pub role: UserRole,
    /// Soft-disable flag; inactive accounts cannot authenticate.
    pub is_active: bool,
    /// Whether the email address has been confirmed.
    pub is_verified: bool,

    // -- Two-factor authentication --
    /// Base32 TOTP shared secret. Present once enrollment has started.
    #[serde(skip_serializing)]
    pub totp_secret: Option<String>,
    /// Whether 2FA is enforced at login. Only true after confirmation.
    pub totp_enabled: bool,

    // -- External identity --
    /// Linked OAuth provider name, e.g. `"github"`.
    pub oauth_provider: Option<String>,
    /// Provider-assigned user id, unique together with the provider name.
    pub oauth_provider_id: Option<String>,

    // -- Lockout state --
    /// Consecutive failed login attempts inside the rolling window.
    pub failed_login_attempts: i32,
    /// When the most recent failed attempt happened.
    pub last_failed_login: Option<DateTime<Utc>>,
    /// Account locked until this time. In the past means not locked.
    pub locked_until: Option<DateTime<Utc>>,

    // -- Single-use tokens --
    /// Pending email verification token.
    #[serde(skip_serializing)]
    pub verification_token: Option<String>,
    /// When the verification token stops being accepted.
    pub verification_token_expires_at: Option<DateTime<Utc>>,
    /// Pending password reset token.
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    /// When the reset token stops being accepted.
    pub reset_token_expires_at: Option<DateTime<Utc>>,

    // -- Timestamps --
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check if the account is currently locked out.
    pub fn is_locked(&self) -> bool {
        self.locked_until.is_some_and(|until| Utc::now() < until)
    }

    /// How long until the lockout lifts, if currently locked.
    pub fn lockout_remaining(&self) -> Option<Duration> {
        self.locked_until
            .map(|until| until - Utc::now())
            .filter(|remaining| *remaining > Duration::zero())
    }

    /// Whether login must be completed with a second factor.
    pub fn requires_second_factor(&self) -> bool {
        self.totp_enabled
    }

    /// Whether this account was created through an OAuth provider and
    /// has no local password.
    pub fn is_oauth_only(&self) -> bool {
        self.password_hash.is_none() && self.oauth_provider.is_some()
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Desired username (already normalized).
    pub username: String,
    /// Email address (already normalized).
    pub email: String,
    /// Pre-hashed password. `None` for OAuth-only accounts.
    pub password_hash: Option<String>,
    /// Assigned role.
    pub role: UserRole,
    /// Whether the email is considered verified at creation.
    pub is_verified: bool,
    /// Linked OAuth provider, if the account originates from one.
    pub oauth_provider: Option<String>,
    /// Provider-assigned user id.
    pub oauth_provider_id: Option<String>,
    /// Initial email verification token, if one should be pending.
    pub verification_token: Option<String>,
    /// Expiry of the initial verification token.
    pub verification_token_expires_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "reader".to_string(),
            email: "reader@example.com".to_string(),
            password_hash: Some("$argon2id$stub".to_string()),
            role: UserRole::User,
            is_active: true,
            is_verified: false,
            totp_secret: None,
            totp_enabled: false,
            oauth_provider: None,
            oauth_provider_id: None,
            failed_login_attempts: 0,
            last_failed_login: None,
            locked_until: None,
            verification_token: None,
            verification_token_expires_at: None,
            reset_token: None,
            reset_token_expires_at: None,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_expired_lock_counts_as_unlocked() {
        let mut user = sample_user();
        user.locked_until = Some(Utc::now() - Duration::minutes(1));
        assert!(!user.is_locked());
        assert!(user.lockout_remaining().is_none());
    }

    #[test]
    fn test_future_lock_is_locked() {
        let mut user = sample_user();
        user.locked_until = Some(Utc::now() + Duration::minutes(10));
        assert!(user.is_locked());
        assert!(user.lockout_remaining().unwrap() > Duration::minutes(9));
    }
}
