//! Two-factor enrollment, verification, and backup code handling.
//!
//! Enrollment is a two-step commit: `enroll` provisions the secret and
//! backup codes but leaves 2FA off; only `confirm` with a valid code
//! flips the enabled flag. A mistyped QR scan therefore cannot lock the
//! account owner out.

use std::sync::Arc;

use totp_rs::{Algorithm, Secret, TOTP};
use tracing::{info, warn};

use shelfwise_core::config::totp::TotpConfig;
use shelfwise_core::error::AppError;
use shelfwise_core::traits::mailer::{MailKind, Mailer};
use shelfwise_database::repositories::{BackupCodeRepository, UserRepository};
use shelfwise_entity::user::User;

use crate::error::{AuthError, AuthResult};
use crate::password::PasswordHasher;
use crate::secrets::generate_backup_code;

/// Everything the user must capture at enrollment time.
///
/// The plaintext backup codes exist only in this value; they are never
/// retrievable again.
#[derive(Debug, Clone)]
pub struct Enrollment {
    /// Base32 shared secret, for manual authenticator entry.
    pub secret: String,
    /// `otpauth://` provisioning URI for QR rendering.
    pub otpauth_url: String,
    /// Single-use fallback codes, shown exactly once.
    pub backup_codes: Vec<String>,
}

/// The second factor supplied at login, classified by shape.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SecondFactor {
    /// A time-step code from the authenticator app.
    Totp(String),
    /// A fallback backup code.
    Backup(String),
}

/// Manages TOTP secrets and backup codes.
#[derive(Clone)]
pub struct TotpManager {
    /// User repository for secret/flag updates.
    user_repo: Arc<UserRepository>,
    /// Backup code persistence.
    backup_codes: Arc<BackupCodeRepository>,
    /// Hashes backup codes at rest.
    hasher: Arc<PasswordHasher>,
    /// Out-of-band notification channel.
    mailer: Arc<dyn Mailer>,
    /// Step/skew/digit parameters.
    config: TotpConfig,
}

impl std::fmt::Debug for TotpManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TotpManager")
            .field("config", &self.config)
            .finish()
    }
}

impl TotpManager {
    /// Creates a new manager.
    pub fn new(
        user_repo: Arc<UserRepository>,
        backup_codes: Arc<BackupCodeRepository>,
        hasher: Arc<PasswordHasher>,
        mailer: Arc<dyn Mailer>,
        config: TotpConfig,
    ) -> Self {
        Self {
            user_repo,
            backup_codes,
            hasher,
            mailer,
            config,
        }
    }

    /// Provision a new shared secret and backup code batch.
    ///
    /// Does **not** enable 2FA; the caller must follow with [`confirm`].
    ///
    /// [`confirm`]: TotpManager::confirm
    pub async fn enroll(&self, user: &User) -> AuthResult<Enrollment> {
        if user.totp_enabled {
            return Err(AuthError::Conflict(
                "Two-factor authentication is already enabled".to_string(),
            ));
        }

        let secret = match Secret::generate_secret().to_encoded() {
            Secret::Encoded(encoded) => encoded,
            Secret::Raw(_) => {
                return Err(AppError::internal("Secret encoding failed").into());
            }
        };

        let backup_codes: Vec<String> = (0..self.config.backup_code_count)
            .map(|_| generate_backup_code())
            .collect();
        let code_hashes = backup_codes
            .iter()
            .map(|code| self.hasher.hash_password(code))
            .collect::<Result<Vec<_>, _>>()?;

        self.backup_codes
            .replace_for_user(user.id, &code_hashes)
            .await?;
        self.user_repo.set_totp_secret(user.id, &secret).await?;

        let otpauth_url = build_totp(&self.config, &secret, &user.username)?.get_url();

        info!(user_id = %user.id, "Two-factor enrollment started");

        Ok(Enrollment {
            secret,
            otpauth_url,
            backup_codes,
        })
    }

    /// Complete enrollment by proving possession of the secret.
    pub async fn confirm(&self, user: &User, code: &str) -> AuthResult<()> {
        let secret = user.totp_secret.as_deref().ok_or_else(|| {
            AuthError::Conflict("Two-factor enrollment has not been started".to_string())
        })?;

        if !self.verify_code(secret, &user.username, code)? {
            return Err(AuthError::InvalidCode);
        }

        if !self.user_repo.enable_totp(user.id).await? {
            return Err(AuthError::Conflict(
                "Two-factor enrollment is no longer pending".to_string(),
            ));
        }

        info!(user_id = %user.id, "Two-factor authentication enabled");
        Ok(())
    }

    /// Verify the second factor during login: a fresh TOTP code or an
    /// unconsumed backup code.
    pub async fn verify_login(&self, user: &User, code: &str) -> AuthResult<()> {
        let secret = user
            .totp_secret
            .as_deref()
            .ok_or(AuthError::InvalidCode)?;

        match classify(code, self.config.digits) {
            SecondFactor::Totp(totp_code) => {
                if self.verify_code(secret, &user.username, &totp_code)? {
                    Ok(())
                } else {
                    Err(AuthError::InvalidCode)
                }
            }
            SecondFactor::Backup(backup_code) => self.spend_backup_code(user, &backup_code).await,
        }
    }

    /// Turn 2FA off. Requires the password again; holding a valid
    /// session is not enough for this action.
    pub async fn disable(&self, user: &User, password: &str) -> AuthResult<()> {
        let hash = user.password_hash.as_deref().ok_or_else(|| {
            AuthError::Forbidden(
                "Password confirmation is not available for this account".to_string(),
            )
        })?;

        if !self.hasher.verify_password(password, hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        self.user_repo.disable_totp(user.id).await?;
        self.backup_codes.delete_for_user(user.id).await?;

        info!(user_id = %user.id, "Two-factor authentication disabled");
        Ok(())
    }

    /// Match the code against the user's unconsumed batch and spend it.
    async fn spend_backup_code(&self, user: &User, code: &str) -> AuthResult<()> {
        let available = self.backup_codes.list_available(user.id).await?;

        for candidate in &available {
            if !self.hasher.verify_password(code, &candidate.code_hash)? {
                continue;
            }
            // Conditional consume: a concurrent spend of the same code
            // leaves this one unmatched.
            if !self.backup_codes.consume(candidate.id).await? {
                continue;
            }

            warn!(
                user_id = %user.id,
                remaining = available.len().saturating_sub(1),
                "Backup code consumed during login"
            );
            if let Err(e) = self
                .mailer
                .send(&user.email, MailKind::BackupCodeUsed, None)
                .await
            {
                warn!(user_id = %user.id, error = %e, "Failed to send backup-code notice");
            }
            return Ok(());
        }

        Err(AuthError::InvalidCode)
    }

    fn verify_code(&self, secret: &str, account_name: &str, code: &str) -> AuthResult<bool> {
        let totp = build_totp(&self.config, secret, account_name)?;
        totp.check_current(code)
            .map_err(|e| AppError::internal(format!("System clock error: {e}")).into())
    }
}

/// Build the TOTP instance for a stored secret.
fn build_totp(config: &TotpConfig, secret_b32: &str, account_name: &str) -> AuthResult<TOTP> {
    let secret_bytes = Secret::Encoded(secret_b32.to_string())
        .to_bytes()
        .map_err(|e| AppError::internal(format!("Stored TOTP secret is invalid: {e:?}")))?;

    TOTP::new(
        Algorithm::SHA1,
        config.digits,
        config.skew_steps,
        config.step_seconds,
        secret_bytes,
        Some(config.issuer.clone()),
        account_name.to_string(),
    )
    .map_err(|e| AppError::internal(format!("Failed to build TOTP: {e:?}")).into())
}

/// Tell a time-step code apart from a backup code by shape: exactly the
/// configured digit count and numeric means TOTP, anything else is
/// treated as a backup code (normalized to uppercase).
fn classify(code: &str, digits: usize) -> SecondFactor {
    let trimmed = code.trim();
    if trimmed.len() == digits && trimmed.chars().all(|c| c.is_ascii_digit()) {
        SecondFactor::Totp(trimmed.to_string())
    } else {
        SecondFactor::Backup(trimmed.to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP";

    fn config() -> TotpConfig {
        TotpConfig::default()
    }

    #[test]
    fn test_code_accepted_within_drift_window() {
        let totp = build_totp(&config(), SECRET, "reader").unwrap();
        let issued_at: u64 = 3_000; // exact step boundary

        let code = totp.generate(issued_at);
        assert!(totp.check(&code, issued_at));
        assert!(totp.check(&code, issued_at + 29)); // same step
        assert!(totp.check(&code, issued_at + 31)); // adjacent step, absorbed by skew
    }

    #[test]
    fn test_code_rejected_past_drift_window() {
        let totp = build_totp(&config(), SECRET, "reader").unwrap();
        let issued_at: u64 = 3_000;

        let code = totp.generate(issued_at);
        assert!(!totp.check(&code, issued_at + 90));
    }

    #[test]
    fn test_provisioning_url_carries_issuer() {
        let totp = build_totp(&config(), SECRET, "reader").unwrap();
        let url = totp.get_url();
        assert!(url.starts_with("otpauth://totp/"));
        assert!(url.contains("Shelfwise"));
    }

    #[test]
    fn test_classify_by_shape() {
        assert_eq!(
            classify(" 123456 ", 6),
            SecondFactor::Totp("123456".to_string())
        );
        assert_eq!(
            classify("a1b2c3d4", 6),
            SecondFactor::Backup("A1B2C3D4".to_string())
        );
        // eight digits is a backup code, not an over-long TOTP
        assert_eq!(
            classify("12345678", 6),
            SecondFactor::Backup("12345678".to_string())
        );
    }
}
