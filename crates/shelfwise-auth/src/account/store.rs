//! Credential store — account creation and password custody.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};
use validator::Validate;

use shelfwise_core::config::auth::AuthConfig;
use shelfwise_core::error::AppError;
use shelfwise_core::traits::mailer::{MailKind, Mailer};
use shelfwise_database::repositories::UserRepository;
use shelfwise_entity::user::model::CreateUser;
use shelfwise_entity::user::{User, UserRole};

use crate::error::{AuthError, AuthResult};
use crate::password::{PasswordHasher, PasswordValidator};
use crate::secrets::generate_opaque_token;

/// Payload for a self-service registration.
#[derive(Debug, Clone, serde::Deserialize, Validate)]
pub struct RegisterRequest {
    /// Desired login name.
    #[validate(length(min = 3, max = 32))]
    pub username: String,
    /// Email address to verify.
    #[validate(email)]
    pub email: String,
    /// Plaintext password, validated against the password policy.
    #[validate(length(max = 128))]
    pub password: String,
}

/// Owns account creation and password verification.
#[derive(Clone)]
pub struct AccountStore {
    /// User persistence.
    user_repo: Arc<UserRepository>,
    /// Argon2id hasher.
    hasher: Arc<PasswordHasher>,
    /// Password policy.
    validator: Arc<PasswordValidator>,
    /// Verification mail channel.
    mailer: Arc<dyn Mailer>,
    /// Token lifetimes.
    config: AuthConfig,
}

impl std::fmt::Debug for AccountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountStore").finish()
    }
}

impl AccountStore {
    /// Creates a new account store.
    pub fn new(
        user_repo: Arc<UserRepository>,
        hasher: Arc<PasswordHasher>,
        validator: Arc<PasswordValidator>,
        mailer: Arc<dyn Mailer>,
        config: AuthConfig,
    ) -> Self {
        Self {
            user_repo,
            hasher,
            validator,
            mailer,
            config,
        }
    }

    /// Register a new account and request a verification mail.
    ///
    /// Usernames are trimmed and emails lower-cased here so uniqueness
    /// checks always see the normalized form. A duplicate of either
    /// surfaces as `Conflict`: pre-checked for a friendly message, and
    /// enforced again by the unique indexes under concurrency.
    pub async fn register(&self, request: &RegisterRequest) -> AuthResult<User> {
        request
            .validate()
            .map_err(|e| AppError::validation(e.to_string()))?;

        let username = request.username.trim().to_string();
        let email = request.email.trim().to_lowercase();

        self.validator.validate(&request.password)?;

        if self.user_repo.find_by_username(&username).await?.is_some() {
            return Err(AuthError::Conflict(
                "Username is already registered".to_string(),
            ));
        }
        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AuthError::Conflict(
                "Email is already registered".to_string(),
            ));
        }

        let password_hash = self.hasher.hash_password(&request.password)?;
        let verification_token = generate_opaque_token();
        let token_expiry =
            Utc::now() + Duration::hours(self.config.verification_token_ttl_hours as i64);

        let user = self
            .user_repo
            .insert(&CreateUser {
                username,
                email,
                password_hash: Some(password_hash),
                role: UserRole::User,
                is_verified: false,
                oauth_provider: None,
                oauth_provider_id: None,
                verification_token: Some(verification_token.clone()),
                verification_token_expires_at: Some(token_expiry),
            })
            .await
            .map_err(|e| match e.kind {
                shelfwise_core::error::ErrorKind::Conflict => {
                    AuthError::Conflict("Username or email is already registered".to_string())
                }
                _ => AuthError::Internal(e),
            })?;

        info!(user_id = %user.id, "User registered");

        if let Err(e) = self
            .mailer
            .send(&user.email, MailKind::Verification, Some(&verification_token))
            .await
        {
            // Registration stands even when the mail relay is down; the
            // user can request a resend.
            warn!(user_id = %user.id, error = %e, "Failed to send verification mail");
        }

        Ok(user)
    }

    /// Verify a plaintext password against the stored hash.
    ///
    /// OAuth-only accounts hold no password and never match.
    pub fn verify_password(&self, user: &User, plaintext: &str) -> AuthResult<bool> {
        match user.password_hash.as_deref() {
            Some(hash) => Ok(self.hasher.verify_password(plaintext, hash)?),
            None => Ok(false),
        }
    }

    /// Returns the password policy for flows that validate before hashing.
    pub fn validator(&self) -> &PasswordValidator {
        &self.validator
    }

    /// Returns the hasher for flows that hash outside this store.
    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// Validate and store a new password for the account.
    ///
    /// Contract for callers: a password change invalidates every
    /// outstanding refresh token, so follow this with
    /// `RefreshTokenLedger::revoke_all_for_user`.
    pub async fn set_password(&self, user: &User, new_password: &str) -> AuthResult<()> {
        self.validator.validate(new_password)?;
        let password_hash = self.hasher.hash_password(new_password)?;
        self.user_repo
            .update_password(user.id, &password_hash)
            .await?;
        Ok(())
    }
}
