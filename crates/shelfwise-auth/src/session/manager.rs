//! Session manager — the end-to-end login/refresh/logout protocol.
//!
//! This is the one place internal outcomes are mapped onto the uniform
//! external messages: unknown identity and wrong password share an
//! error, and every refresh failure collapses to `Unauthorized` so the
//! caller learns nothing about token lifecycle state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use shelfwise_core::config::auth::AuthConfig;
use shelfwise_core::traits::oauth::ProviderIdentity;
use shelfwise_database::repositories::UserRepository;
use shelfwise_entity::user::User;

use crate::account::AccountStore;
use crate::error::{AuthError, AuthResult};
use crate::jwt::{AccessTokenDecoder, AccessTokenEncoder};
use crate::lockout::LockoutGuard;
use crate::oauth::OAuthLinker;
use crate::totp::TotpManager;

use super::ledger::RefreshTokenLedger;

/// Credentials presented at login.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct LoginRequest {
    /// Email address the account was registered with.
    pub email: String,
    /// Plaintext password.
    pub password: String,
    /// Second factor, required when 2FA is enabled on the account.
    pub totp_code: Option<String>,
}

/// The token pair returned to a freshly authenticated client.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionTokens {
    /// Short-lived signed access token.
    pub access_token: String,
    /// When the access token expires.
    pub access_expires_at: DateTime<Utc>,
    /// Opaque refresh token.
    pub refresh_token: String,
    /// When the refresh token expires.
    pub refresh_expires_at: DateTime<Utc>,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginResult {
    /// Issued tokens.
    pub tokens: SessionTokens,
    /// The authenticated user.
    pub user: User,
}

/// Composes the credential store, lockout guard, 2FA manager, and the
/// two token components into the login state machine.
#[derive(Clone)]
pub struct AuthSessionManager {
    /// User persistence.
    user_repo: Arc<UserRepository>,
    /// Credential verification.
    account: Arc<AccountStore>,
    /// Brute-force gate.
    lockout: Arc<LockoutGuard>,
    /// Second-factor verification.
    totp: Arc<TotpManager>,
    /// External identity resolution.
    linker: Arc<OAuthLinker>,
    /// Access token signing.
    encoder: Arc<AccessTokenEncoder>,
    /// Access token validation.
    decoder: Arc<AccessTokenDecoder>,
    /// Refresh token ledger.
    ledger: Arc<RefreshTokenLedger>,
    /// Login policy knobs.
    config: AuthConfig,
}

impl std::fmt::Debug for AuthSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSessionManager").finish()
    }
}

impl AuthSessionManager {
    /// Creates a new session manager with all required dependencies.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_repo: Arc<UserRepository>,
        account: Arc<AccountStore>,
        lockout: Arc<LockoutGuard>,
        totp: Arc<TotpManager>,
        linker: Arc<OAuthLinker>,
        encoder: Arc<AccessTokenEncoder>,
        decoder: Arc<AccessTokenDecoder>,
        ledger: Arc<RefreshTokenLedger>,
        config: AuthConfig,
    ) -> Self {
        Self {
            user_repo,
            account,
            lockout,
            totp,
            linker,
            encoder,
            decoder,
            ledger,
            config,
        }
    }

    /// Performs the complete login flow:
    ///
    /// 1. Resolve the account (unknown identity reads as bad credentials)
    /// 2. Lockout check, before any hashing work
    /// 3. Password verification; failures feed the lockout counter
    /// 4. Active / verified policy gates
    /// 5. Second factor, when enrolled (failures also feed the counter)
    /// 6. Counter reset and token issuance
    pub async fn login(
        &self,
        request: &LoginRequest,
        device_info: Option<&str>,
    ) -> AuthResult<LoginResult> {
        // Step 1: Find the account
        let user = self
            .user_repo
            .find_by_email(request.email.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        // Step 2: Lockout gate
        self.lockout.check(&user).await?;

        // Step 3: Password check; record the failure only after a wrong
        // result, never before.
        if !self.account.verify_password(&user, &request.password)? {
            self.lockout.record_failure(user.id).await?;
            return Err(AuthError::InvalidCredentials);
        }

        // Step 4: Account-state gates
        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }
        if self.config.require_verified_login && !user.is_verified {
            return Err(AuthError::EmailNotVerified);
        }

        // Step 5: Second factor. Failed codes count toward lockout too.
        if user.requires_second_factor() {
            let code = request
                .totp_code
                .as_deref()
                .ok_or(AuthError::TwoFactorRequired)?;
            if let Err(e) = self.totp.verify_login(&user, code).await {
                if matches!(e, AuthError::InvalidCode) {
                    self.lockout.record_failure(user.id).await?;
                }
                return Err(e);
            }
        }

        // Step 6: Reset counters and issue the session
        if user.failed_login_attempts > 0 || user.locked_until.is_some() {
            self.lockout.record_success(user.id).await?;
        }
        let _ = self.user_repo.update_last_login(user.id).await;

        let tokens = self.issue_session(&user, device_info).await?;

        info!(user_id = %user.id, "Login successful");
        Ok(LoginResult { tokens, user })
    }

    /// Login via an already-verified provider identity.
    ///
    /// Converges on the same token-issuance step as password login; the
    /// provider stands in for both password and second factor.
    pub async fn login_with_provider(
        &self,
        identity: &ProviderIdentity,
        device_info: Option<&str>,
    ) -> AuthResult<LoginResult> {
        let user = self.linker.resolve(identity).await?;

        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        let _ = self.user_repo.update_last_login(user.id).await;
        let tokens = self.issue_session(&user, device_info).await?;

        info!(
            user_id = %user.id,
            provider = %identity.provider,
            "Provider login successful"
        );
        Ok(LoginResult { tokens, user })
    }

    /// Exchange a refresh token for a fresh token pair.
    ///
    /// Every failure (unknown, expired, revoked, disabled account)
    /// surfaces as the same `Unauthorized`.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<SessionTokens> {
        let redeemed = self
            .ledger
            .redeem(refresh_token)
            .await
            .map_err(AuthError::into_uniform)?;

        let user = self
            .user_repo
            .find_by_id(redeemed.user_id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if !user.is_active {
            warn!(user_id = %user.id, "Refresh attempt on deactivated account");
            return Err(AuthError::Unauthorized);
        }

        self.issue_session(&user, redeemed.device_info.as_deref())
            .await
    }

    /// Revoke the presented refresh token. Idempotent regardless of the
    /// token's validity.
    pub async fn logout(&self, refresh_token: &str) -> AuthResult<()> {
        self.ledger.revoke(refresh_token).await?;
        Ok(())
    }

    /// Resolve the bearer of an access token to a live account.
    pub async fn authenticate(&self, access_token: &str) -> AuthResult<User> {
        let claims = self
            .decoder
            .decode(access_token)
            .map_err(AuthError::into_uniform)?;

        let user = self
            .user_repo
            .find_by_id(claims.user_id())
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        Ok(user)
    }

    /// Sign an access token and issue a refresh token for the user.
    async fn issue_session(
        &self,
        user: &User,
        device_info: Option<&str>,
    ) -> AuthResult<SessionTokens> {
        let access = self.encoder.issue(user.id, user.role)?;
        let refresh = self.ledger.issue(user.id, device_info).await?;

        Ok(SessionTokens {
            access_token: access.token,
            access_expires_at: access.expires_at,
            refresh_token: refresh.token,
            refresh_expires_at: refresh.expires_at,
        })
    }
}
