//! Refresh token ledger — issuance, redemption, and revocation of the
//! persisted long-lived tokens.
//!
//! Redemption rotates: the spent token is revoked in the same conditional
//! update that claims it, and the caller issues a replacement.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use shelfwise_core::config::auth::AuthConfig;
use shelfwise_core::result::AppResult;
use shelfwise_database::repositories::RefreshTokenRepository;
use shelfwise_entity::token::refresh::CreateRefreshToken;

use crate::error::{AuthError, AuthResult};
use crate::secrets::{generate_opaque_token, sha256_hex};

/// A freshly issued refresh token. The plaintext value exists only here.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IssuedRefreshToken {
    /// Opaque token value handed to the client.
    pub token: String,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
}

/// The outcome of spending a refresh token.
#[derive(Debug, Clone)]
pub struct RedeemedToken {
    /// The owning user.
    pub user_id: Uuid,
    /// Device descriptor carried over to the replacement token.
    pub device_info: Option<String>,
}

/// Issues and redeems opaque, revocable refresh tokens.
#[derive(Debug, Clone)]
pub struct RefreshTokenLedger {
    /// Token persistence.
    repo: Arc<RefreshTokenRepository>,
    /// Token lifetime in days.
    ttl_days: i64,
}

impl RefreshTokenLedger {
    /// Creates a new ledger.
    pub fn new(repo: Arc<RefreshTokenRepository>, config: &AuthConfig) -> Self {
        Self {
            repo,
            ttl_days: config.refresh_token_ttl_days as i64,
        }
    }

    /// Issue a new token for the user.
    ///
    /// Only the SHA-256 digest is stored; the returned plaintext cannot
    /// be recovered afterwards.
    pub async fn issue(
        &self,
        user_id: Uuid,
        device_info: Option<&str>,
    ) -> AuthResult<IssuedRefreshToken> {
        let token = generate_opaque_token();
        let expires_at = Utc::now() + Duration::days(self.ttl_days);

        self.repo
            .insert(&CreateRefreshToken {
                token_hash: sha256_hex(&token),
                user_id,
                expires_at,
                device_info: device_info.map(str::to_string),
            })
            .await?;

        Ok(IssuedRefreshToken { token, expires_at })
    }

    /// Spend a token, revoking it in the same step (rotation).
    ///
    /// A revoked or expired token never redeems; when two requests race
    /// on the same value, the conditional claim lets exactly one through
    /// and the loser observes the revocation.
    pub async fn redeem(&self, token_value: &str) -> AuthResult<RedeemedToken> {
        let token_hash = sha256_hex(token_value);

        let existing = self
            .repo
            .find_by_hash(&token_hash)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if existing.is_revoked {
            return Err(AuthError::TokenRevoked);
        }
        if existing.is_expired() {
            return Err(AuthError::TokenExpired);
        }

        let claimed = self
            .repo
            .claim_for_rotation(&token_hash)
            .await?
            .ok_or(AuthError::TokenRevoked)?;

        Ok(RedeemedToken {
            user_id: claimed.user_id,
            device_info: claimed.device_info,
        })
    }

    /// Revoke a token by value. Idempotent: unknown, expired, and
    /// already-revoked values all succeed silently.
    pub async fn revoke(&self, token_value: &str) -> AppResult<()> {
        self.repo.revoke_by_hash(&sha256_hex(token_value)).await
    }

    /// Revoke every live token the user holds (password change/reset).
    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let revoked = self.repo.revoke_all_for_user(user_id).await?;
        if revoked > 0 {
            info!(user_id = %user_id, revoked, "Bulk-revoked refresh tokens");
        }
        Ok(revoked)
    }

    /// Delete rows past their expiry. Housekeeping, not correctness:
    /// expired rows already never redeem.
    pub async fn prune_expired(&self) -> AppResult<u64> {
        self.repo.delete_expired().await
    }
}
