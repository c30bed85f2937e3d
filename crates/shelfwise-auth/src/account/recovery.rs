//! Email verification and password recovery flows.
//!
//! Replies for address-keyed requests (resend, forgot-password) are
//! identical whether or not the address exists, so these endpoints
//! cannot be used to enumerate accounts.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use shelfwise_core::config::auth::AuthConfig;
use shelfwise_core::traits::mailer::{MailKind, Mailer};
use shelfwise_database::repositories::UserRepository;
use shelfwise_entity::user::User;

use crate::account::store::AccountStore;
use crate::error::{AuthError, AuthResult};
use crate::secrets::generate_opaque_token;
use crate::session::ledger::RefreshTokenLedger;

/// Drives the verification-token and reset-token lifecycles.
#[derive(Clone)]
pub struct AccountRecovery {
    /// User persistence.
    user_repo: Arc<UserRepository>,
    /// Credential custody (hashing, policy).
    account: Arc<AccountStore>,
    /// Refresh token ledger, bulk-revoked on every password change.
    ledger: Arc<RefreshTokenLedger>,
    /// Mail channel.
    mailer: Arc<dyn Mailer>,
    /// Token lifetimes.
    config: AuthConfig,
}

impl std::fmt::Debug for AccountRecovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountRecovery").finish()
    }
}

impl AccountRecovery {
    /// Creates a new recovery service.
    pub fn new(
        user_repo: Arc<UserRepository>,
        account: Arc<AccountStore>,
        ledger: Arc<RefreshTokenLedger>,
        mailer: Arc<dyn Mailer>,
        config: AuthConfig,
    ) -> Self {
        Self {
            user_repo,
            account,
            ledger,
            mailer,
            config,
        }
    }

    // -- Email verification ----------------------------------------------

    /// Confirm an email address with the token from the mail link.
    ///
    /// Tokens are single-use: the conditional update spends the token in
    /// the same statement that flips the verified flag, and an expired
    /// token is cleared rather than left lingering.
    pub async fn verify_email(&self, token: &str) -> AuthResult<()> {
        let user = self
            .user_repo
            .find_by_verification_token(token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if token_expired(user.verification_token_expires_at) {
            self.user_repo.clear_verification_token(user.id).await?;
            return Err(AuthError::InvalidToken);
        }

        if !self.user_repo.mark_verified(user.id, token).await? {
            return Err(AuthError::InvalidToken);
        }

        info!(user_id = %user.id, "Email address verified");
        Ok(())
    }

    /// Rotate and resend the verification token.
    ///
    /// The reply never discloses whether the address exists or is
    /// already verified.
    pub async fn resend_verification(&self, email: &str) -> AuthResult<()> {
        let Some(user) = self.user_repo.find_by_email(email.trim()).await? else {
            debug!("Verification resend requested for unknown address");
            return Ok(());
        };
        if user.is_verified {
            return Ok(());
        }

        let token = generate_opaque_token();
        let expires_at =
            Utc::now() + Duration::hours(self.config.verification_token_ttl_hours as i64);
        self.user_repo
            .set_verification_token(user.id, &token, expires_at)
            .await?;

        self.send_best_effort(&user, MailKind::Verification, Some(&token))
            .await;
        Ok(())
    }

    // -- Password reset --------------------------------------------------

    /// Start a password reset for the given address.
    pub async fn forgot_password(&self, email: &str) -> AuthResult<()> {
        let Some(user) = self.user_repo.find_by_email(email.trim()).await? else {
            debug!("Password reset requested for unknown address");
            return Ok(());
        };

        let token = generate_opaque_token();
        let expires_at = Utc::now() + Duration::hours(self.config.reset_token_ttl_hours as i64);
        self.user_repo
            .set_reset_token(user.id, &token, expires_at)
            .await?;

        self.send_best_effort(&user, MailKind::PasswordReset, Some(&token))
            .await;
        Ok(())
    }

    /// Complete a password reset with the token from the mail link.
    ///
    /// On success the reset token is spent, the lockout counters are
    /// cleared, and every outstanding refresh token for the account is
    /// revoked.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AuthResult<()> {
        let user = self
            .user_repo
            .find_by_reset_token(token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if token_expired(user.reset_token_expires_at) {
            self.user_repo.clear_reset_token(user.id).await?;
            return Err(AuthError::InvalidToken);
        }

        self.account.validator().validate(new_password)?;
        let password_hash = self.account.hasher().hash_password(new_password)?;

        if !self
            .user_repo
            .apply_password_reset(user.id, token, &password_hash)
            .await?
        {
            return Err(AuthError::InvalidToken);
        }

        let revoked = self.ledger.revoke_all_for_user(user.id).await?;
        warn!(
            user_id = %user.id,
            revoked_tokens = revoked,
            "Password reset completed; sessions revoked"
        );

        self.send_best_effort(&user, MailKind::PasswordChanged, None)
            .await;
        Ok(())
    }

    /// Change the password of an authenticated user.
    ///
    /// Requires the current password, refuses a no-op change, and
    /// bulk-revokes refresh tokens exactly like a reset does.
    pub async fn change_password(
        &self,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        if !self.account.verify_password(user, current_password)? {
            return Err(AuthError::InvalidCredentials);
        }
        self.account
            .validator()
            .validate_not_same(current_password, new_password)?;

        self.account.set_password(user, new_password).await?;

        let revoked = self.ledger.revoke_all_for_user(user.id).await?;
        info!(
            user_id = %user.id,
            revoked_tokens = revoked,
            "Password changed; sessions revoked"
        );

        self.send_best_effort(user, MailKind::PasswordChanged, None)
            .await;
        Ok(())
    }

    async fn send_best_effort(&self, user: &User, kind: MailKind, token: Option<&str>) {
        if let Err(e) = self.mailer.send(&user.email, kind, token).await {
            warn!(user_id = %user.id, kind = ?kind, error = %e, "Failed to send mail");
        }
    }
}

/// A missing expiry counts as expired; these tokens never live forever.
fn token_expired(expires_at: Option<chrono::DateTime<Utc>>) -> bool {
    expires_at.is_none_or(|at| at <= Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_expiry_counts_as_expired() {
        assert!(token_expired(None));
        assert!(token_expired(Some(Utc::now() - Duration::seconds(1))));
        assert!(!token_expired(Some(Utc::now() + Duration::hours(1))));
    }
}
