//! Backup code repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use shelfwise_core::error::{AppError, ErrorKind};
use shelfwise_core::result::AppResult;
use shelfwise_entity::twofactor::BackupCode;

/// Repository for hashed 2FA backup codes.
#[derive(Debug, Clone)]
pub struct BackupCodeRepository {
    pool: PgPool,
}

impl BackupCodeRepository {
    /// Create a new backup code repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Replace a user's batch with freshly hashed codes.
    ///
    /// Runs in a transaction so the user never observes a partial batch.
    pub async fn replace_for_user(&self, user_id: Uuid, code_hashes: &[String]) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        sqlx::query("DELETE FROM two_factor_backup_codes WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to clear old codes", e)
            })?;

        for hash in code_hashes {
            sqlx::query(
                "INSERT INTO two_factor_backup_codes (user_id, code_hash) VALUES ($1, $2)",
            )
            .bind(user_id)
            .bind(hash)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to insert backup code", e)
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit backup codes", e)
        })
    }

    /// List the codes a user can still spend.
    pub async fn list_available(&self, user_id: Uuid) -> AppResult<Vec<BackupCode>> {
        sqlx::query_as::<_, BackupCode>(
            "SELECT * FROM two_factor_backup_codes \
             WHERE user_id = $1 AND consumed_at IS NULL ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list backup codes", e))
    }

    /// Spend one code. Conditional on it being unspent, so a code can be
    /// consumed exactly once even under concurrent attempts.
    pub async fn consume(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE two_factor_backup_codes SET consumed_at = NOW() \
             WHERE id = $1 AND consumed_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to consume backup code", e)
        })?;

        Ok(result.rows_affected() == 1)
    }

    /// Count the codes a user can still spend.
    pub async fn count_available(&self, user_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM two_factor_backup_codes \
             WHERE user_id = $1 AND consumed_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count backup codes", e))
    }

    /// Remove all of a user's codes (2FA disable).
    pub async fn delete_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM two_factor_backup_codes WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete backup codes", e)
            })?;

        Ok(result.rows_affected())
    }
}
