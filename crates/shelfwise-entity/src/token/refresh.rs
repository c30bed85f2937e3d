//! Refresh token entity model.
//!
//! Refresh tokens are opaque: the client holds the random plaintext value,
//! the ledger stores only its SHA-256 digest. Access tokens, by contrast,
//! are stateless and never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted, revocable refresh token. One row per device/session.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    /// Surrogate primary key.
    pub id: i64,
    /// SHA-256 hex digest of the opaque token value (unique).
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// Owning user.
    pub user_id: Uuid,
    /// Absolute expiry; expired tokens are never redeemable.
    pub expires_at: DateTime<Utc>,
    /// Set on logout, rotation, or bulk revocation.
    pub is_revoked: bool,
    /// Free-text device/client descriptor (User-Agent, "OAuth github", ...).
    pub device_info: Option<String>,
    /// When the token was issued.
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Check whether the token has passed its expiry.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Check whether the token can still be redeemed.
    pub fn is_redeemable(&self) -> bool {
        !self.is_revoked && !self.is_expired()
    }
}

/// Data required to persist a newly issued refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRefreshToken {
    /// SHA-256 hex digest of the opaque value.
    pub token_hash: String,
    /// Owning user.
    pub user_id: Uuid,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
    /// Device/client descriptor.
    pub device_info: Option<String>,
}
