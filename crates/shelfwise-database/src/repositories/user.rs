//! User repository implementation.
//!
//! Every lifecycle mutation here is a single conditional statement so that
//! concurrent requests cannot under-count lockout attempts, double-spend a
//! single-use token, or overwrite an existing provider link.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use shelfwise_core::error::{AppError, ErrorKind};
use shelfwise_core::result::AppResult;
use shelfwise_core::types::pagination::{PageRequest, PageResponse};
use shelfwise_entity::user::model::CreateUser;
use shelfwise_entity::user::{User, UserRole};

use super::map_db_err;

/// Repository for user CRUD and conditional lifecycle updates.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))
    }

    /// Find a user by username (case-insensitive).
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(username) = LOWER($1)")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by username", e)
            })
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by email", e)
            })
    }

    /// Find a user by external identity.
    pub async fn find_by_oauth_identity(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE oauth_provider = $1 AND oauth_provider_id = $2",
        )
        .bind(provider)
        .bind(provider_user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find user by identity", e)
        })
    }

    /// Insert a new user.
    ///
    /// A duplicate username, email, or provider identity surfaces as
    /// `Conflict` via the table's unique indexes.
    pub async fn insert(&self, create: &CreateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, password_hash, role, is_verified, \
             oauth_provider, oauth_provider_id, verification_token, verification_token_expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING *",
        )
        .bind(&create.username)
        .bind(&create.email)
        .bind(&create.password_hash)
        .bind(create.role)
        .bind(create.is_verified)
        .bind(&create.oauth_provider)
        .bind(&create.oauth_provider_id)
        .bind(&create.verification_token)
        .bind(create.verification_token_expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_db_err(
                "Failed to insert user",
                "Username or email is already registered",
                e,
            )
        })
    }

    /// List all users with pagination, newest first.
    pub async fn find_all(&self, page: &PageRequest) -> AppResult<PageResponse<User>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count users", e))?;

        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list users", e))?;

        Ok(PageResponse::new(
            users,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    /// Update a user's role.
    pub async fn set_role(&self, id: Uuid, role: UserRole) -> AppResult<()> {
        self.expect_one_row(
            sqlx::query("UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(role),
            "Failed to update role",
        )
        .await
    }

    /// Activate or deactivate an account.
    pub async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<()> {
        self.expect_one_row(
            sqlx::query("UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(is_active),
            "Failed to update active flag",
        )
        .await
    }

    /// Replace the password hash.
    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        self.expect_one_row(
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(password_hash),
            "Failed to update password",
        )
        .await
    }

    /// Stamp a successful login.
    pub async fn update_last_login(&self, id: Uuid) -> AppResult<()> {
        self.expect_one_row(
            sqlx::query("UPDATE users SET last_login_at = NOW(), updated_at = NOW() WHERE id = $1")
                .bind(id),
            "Failed to stamp last login",
        )
        .await
    }

    // -- Lockout state ---------------------------------------------------

    /// Record one failed login attempt and return the resulting counter.
    ///
    /// Failures older than `window_start` do not carry over: the counter
    /// restarts at 1 when the previous failure fell outside the window.
    /// The whole read-modify-write is one statement, so two concurrent
    /// failures cannot under-count.
    pub async fn record_failed_attempt(
        &self,
        id: Uuid,
        window_start: DateTime<Utc>,
    ) -> AppResult<i32> {
        sqlx::query_scalar::<_, i32>(
            "UPDATE users SET \
               failed_login_attempts = CASE \
                 WHEN last_failed_login IS NULL OR last_failed_login < $2 THEN 1 \
                 ELSE failed_login_attempts + 1 END, \
               last_failed_login = NOW(), \
               updated_at = NOW() \
             WHERE id = $1 \
             RETURNING failed_login_attempts",
        )
        .bind(id)
        .bind(window_start)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record failed attempt", e)
        })
    }

    /// Lock the account until the given time.
    pub async fn lock_until(&self, id: Uuid, locked_until: DateTime<Utc>) -> AppResult<()> {
        self.expect_one_row(
            sqlx::query("UPDATE users SET locked_until = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(locked_until),
            "Failed to lock account",
        )
        .await
    }

    /// Clear the failure counter and any lockout.
    pub async fn reset_lockout(&self, id: Uuid) -> AppResult<()> {
        self.expect_one_row(
            sqlx::query(
                "UPDATE users SET failed_login_attempts = 0, last_failed_login = NULL, \
                 locked_until = NULL, updated_at = NOW() WHERE id = $1",
            )
            .bind(id),
            "Failed to reset lockout state",
        )
        .await
    }

    // -- Email verification ----------------------------------------------

    /// Store a fresh verification token.
    pub async fn set_verification_token(
        &self,
        id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        self.expect_one_row(
            sqlx::query(
                "UPDATE users SET verification_token = $2, \
                 verification_token_expires_at = $3, updated_at = NOW() WHERE id = $1",
            )
            .bind(id)
            .bind(token)
            .bind(expires_at),
            "Failed to set verification token",
        )
        .await
    }

    /// Find the user holding a pending verification token.
    pub async fn find_by_verification_token(&self, token: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE verification_token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to look up verification", e)
            })
    }

    /// Mark the account verified, spending the token.
    ///
    /// Conditional on the token still matching, so a token can be spent
    /// at most once. Returns `false` if another request got there first.
    pub async fn mark_verified(&self, id: Uuid, token: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET is_verified = TRUE, verification_token = NULL, \
             verification_token_expires_at = NULL, updated_at = NOW() \
             WHERE id = $1 AND verification_token = $2",
        )
        .bind(id)
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark verified", e))?;

        Ok(result.rows_affected() == 1)
    }

    /// Drop an expired verification token without verifying.
    pub async fn clear_verification_token(&self, id: Uuid) -> AppResult<()> {
        self.expect_one_row(
            sqlx::query(
                "UPDATE users SET verification_token = NULL, \
                 verification_token_expires_at = NULL, updated_at = NOW() WHERE id = $1",
            )
            .bind(id),
            "Failed to clear verification token",
        )
        .await
    }

    // -- Password reset --------------------------------------------------

    /// Store a fresh password reset token.
    pub async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        self.expect_one_row(
            sqlx::query(
                "UPDATE users SET reset_token = $2, reset_token_expires_at = $3, \
                 updated_at = NOW() WHERE id = $1",
            )
            .bind(id)
            .bind(token)
            .bind(expires_at),
            "Failed to set reset token",
        )
        .await
    }

    /// Find the user holding a pending reset token.
    pub async fn find_by_reset_token(&self, token: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE reset_token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to look up reset token", e)
            })
    }

    /// Apply a password reset, spending the token and clearing lockout
    /// state in the same statement. Returns `false` if the token was
    /// already spent.
    pub async fn apply_password_reset(
        &self,
        id: Uuid,
        token: &str,
        password_hash: &str,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $3, reset_token = NULL, \
             reset_token_expires_at = NULL, failed_login_attempts = 0, \
             last_failed_login = NULL, locked_until = NULL, updated_at = NOW() \
             WHERE id = $1 AND reset_token = $2",
        )
        .bind(id)
        .bind(token)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to reset password", e))?;

        Ok(result.rows_affected() == 1)
    }

    /// Drop an expired reset token without changing the password.
    pub async fn clear_reset_token(&self, id: Uuid) -> AppResult<()> {
        self.expect_one_row(
            sqlx::query(
                "UPDATE users SET reset_token = NULL, reset_token_expires_at = NULL, \
                 updated_at = NOW() WHERE id = $1",
            )
            .bind(id),
            "Failed to clear reset token",
        )
        .await
    }

    // -- Two-factor ------------------------------------------------------

    /// Store the enrollment secret. Does not enable 2FA.
    pub async fn set_totp_secret(&self, id: Uuid, secret: &str) -> AppResult<()> {
        self.expect_one_row(
            sqlx::query("UPDATE users SET totp_secret = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(secret),
            "Failed to store TOTP secret",
        )
        .await
    }

    /// Enable 2FA. Conditional on a secret being present so the enabled
    /// flag can never exist without one.
    pub async fn enable_totp(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET totp_enabled = TRUE, updated_at = NOW() \
             WHERE id = $1 AND totp_secret IS NOT NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to enable 2FA", e))?;

        Ok(result.rows_affected() == 1)
    }

    /// Clear the secret and the enabled flag.
    pub async fn disable_totp(&self, id: Uuid) -> AppResult<()> {
        self.expect_one_row(
            sqlx::query(
                "UPDATE users SET totp_secret = NULL, totp_enabled = FALSE, \
                 updated_at = NOW() WHERE id = $1",
            )
            .bind(id),
            "Failed to disable 2FA",
        )
        .await
    }

    // -- External identity -----------------------------------------------

    /// Link a provider identity to an existing account.
    ///
    /// Conditional on no provider being linked yet: an account already
    /// linked to a different provider is left untouched and the caller
    /// sees `false`.
    pub async fn link_oauth_identity(
        &self,
        id: Uuid,
        provider: &str,
        provider_user_id: &str,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET oauth_provider = $2, oauth_provider_id = $3, \
             updated_at = NOW() WHERE id = $1 AND oauth_provider IS NULL",
        )
        .bind(id)
        .bind(provider)
        .bind(provider_user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_db_err(
                "Failed to link provider identity",
                "Provider identity is already linked to another account",
                e,
            )
        })?;

        Ok(result.rows_affected() == 1)
    }

    /// Run an update that must touch exactly one row.
    async fn expect_one_row(
        &self,
        query: sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments>,
        context: &str,
    ) -> AppResult<()> {
        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, context.to_string(), e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User not found"));
        }
        Ok(())
    }
}
