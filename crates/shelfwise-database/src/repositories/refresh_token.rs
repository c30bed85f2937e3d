//! Refresh token repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use shelfwise_core::error::{AppError, ErrorKind};
use shelfwise_core::result::AppResult;
use shelfwise_entity::token::refresh::{CreateRefreshToken, RefreshToken};

use super::map_db_err;

/// Repository for the persisted refresh token ledger.
#[derive(Debug, Clone)]
pub struct RefreshTokenRepository {
    pool: PgPool,
}

impl RefreshTokenRepository {
    /// Create a new refresh token repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a newly issued token.
    pub async fn insert(&self, create: &CreateRefreshToken) -> AppResult<RefreshToken> {
        sqlx::query_as::<_, RefreshToken>(
            "INSERT INTO refresh_tokens (token_hash, user_id, expires_at, device_info) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(&create.token_hash)
        .bind(create.user_id)
        .bind(create.expires_at)
        .bind(&create.device_info)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_db_err(
                "Failed to insert refresh token",
                "Refresh token value collision",
                e,
            )
        })
    }

    /// Look up a token by its stored digest.
    pub async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshToken>> {
        sqlx::query_as::<_, RefreshToken>("SELECT * FROM refresh_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find refresh token", e)
            })
    }

    /// Atomically claim a token for redemption: flips `is_revoked` and
    /// returns the row only if it was still live and unexpired.
    ///
    /// Two concurrent redemptions of the same value race on this update;
    /// exactly one sees the row, the other gets `None`.
    pub async fn claim_for_rotation(&self, token_hash: &str) -> AppResult<Option<RefreshToken>> {
        sqlx::query_as::<_, RefreshToken>(
            "UPDATE refresh_tokens SET is_revoked = TRUE \
             WHERE token_hash = $1 AND is_revoked = FALSE AND expires_at > NOW() \
             RETURNING *",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to claim refresh token", e)
        })
    }

    /// Mark a token revoked. Idempotent: revoking an already revoked,
    /// expired, or unknown token is not an error.
    pub async fn revoke_by_hash(&self, token_hash: &str) -> AppResult<()> {
        sqlx::query("UPDATE refresh_tokens SET is_revoked = TRUE WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to revoke refresh token", e)
            })?;
        Ok(())
    }

    /// Revoke every live token a user holds. Returns how many were hit.
    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET is_revoked = TRUE \
             WHERE user_id = $1 AND is_revoked = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to bulk-revoke tokens", e)
        })?;

        Ok(result.rows_affected())
    }

    /// Delete rows whose expiry has passed. Returns how many were removed.
    pub async fn delete_expired(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to prune expired tokens", e)
            })?;

        Ok(result.rows_affected())
    }
}
