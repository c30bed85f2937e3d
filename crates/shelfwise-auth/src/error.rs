//! Typed authentication outcomes.
//!
//! Components in this crate return [`AuthError`] so the login flow can
//! tell outcomes apart; only the session manager collapses them into the
//! deliberately uniform messages the outside world sees. Wrong-password
//! and unknown-identity share one variant by construction, which keeps
//! account enumeration off the table.

use thiserror::Error;

use shelfwise_core::error::AppError;

/// A specialized `Result` for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Expected, caller-recoverable authentication outcomes.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Duplicate username, email, or provider link.
    #[error("{0}")]
    Conflict(String),

    /// Wrong password or unknown identity, indistinguishable on purpose.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The account is locked out from too many failed attempts.
    #[error("Account locked. Try again in {retry_after_minutes} minutes")]
    AccountLocked {
        /// Whole minutes until the lock lifts (at least 1).
        retry_after_minutes: i64,
    },

    /// Login requires a verified email address.
    #[error("Email address has not been verified")]
    EmailNotVerified,

    /// The account has been deactivated.
    #[error("Account is deactivated")]
    AccountDisabled,

    /// 2FA is enabled but no second factor was supplied.
    #[error("A two-factor code is required")]
    TwoFactorRequired,

    /// The supplied TOTP or backup code did not verify.
    #[error("Invalid two-factor code")]
    InvalidCode,

    /// A refresh token past its expiry.
    #[error("Token has expired")]
    TokenExpired,

    /// A refresh token that was revoked or already rotated.
    #[error("Token has been revoked")]
    TokenRevoked,

    /// An invalid or expired verification/reset token.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The uniform outward-facing credential failure. Internal causes
    /// (expired vs revoked vs unknown) are collapsed into this at the
    /// session-manager boundary.
    #[error("Could not validate credentials")]
    Unauthorized,

    /// Role or active-state gate refused the operation.
    #[error("{0}")]
    Forbidden(String),

    /// Infrastructure failure (database, signing key, mail relay).
    #[error(transparent)]
    Internal(#[from] AppError),
}

impl AuthError {
    /// Collapse token-lifecycle failures into the uniform outward error.
    ///
    /// Expected at the refresh boundary, where distinguishing expired
    /// from revoked would leak token-lifecycle information.
    pub fn into_uniform(self) -> AuthError {
        match self {
            AuthError::TokenExpired
            | AuthError::TokenRevoked
            | AuthError::InvalidToken
            | AuthError::InvalidCredentials
            | AuthError::AccountDisabled => AuthError::Unauthorized,
            other => other,
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Conflict(message) => AppError::conflict(message),
            AuthError::InvalidCredentials => AppError::unauthorized(err.to_string()),
            AuthError::AccountLocked { .. } => AppError::rate_limited(err.to_string()),
            AuthError::EmailNotVerified => AppError::forbidden(err.to_string()),
            AuthError::AccountDisabled => AppError::forbidden(err.to_string()),
            AuthError::TwoFactorRequired => AppError::unauthorized(err.to_string()),
            AuthError::InvalidCode => AppError::unauthorized(err.to_string()),
            AuthError::TokenExpired
            | AuthError::TokenRevoked
            | AuthError::Unauthorized => AppError::unauthorized("Could not validate credentials"),
            AuthError::InvalidToken => AppError::validation(err.to_string()),
            AuthError::Forbidden(message) => AppError::forbidden(message),
            AuthError::Internal(inner) => inner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_collapse_hides_lifecycle() {
        let expired = AuthError::TokenExpired.into_uniform();
        let revoked = AuthError::TokenRevoked.into_uniform();
        assert_eq!(expired.to_string(), revoked.to_string());
        assert!(matches!(expired, AuthError::Unauthorized));
    }

    #[test]
    fn test_locked_keeps_retry_after() {
        let locked = AuthError::AccountLocked {
            retry_after_minutes: 12,
        }
        .into_uniform();
        assert!(matches!(
            locked,
            AuthError::AccountLocked {
                retry_after_minutes: 12
            }
        ));
    }
}
