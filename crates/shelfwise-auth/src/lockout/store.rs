//! Pluggable counting store behind the lockout guard.
//!
//! The default deployment counts on the `users` row itself (one shared
//! logical store); a multi-instance deployment can swap in another
//! backend without touching the guard.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use shelfwise_core::result::AppResult;
use shelfwise_database::repositories::UserRepository;

/// Per-account lockout counters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LockoutState {
    /// Failed attempts inside the current window.
    pub failed_attempts: u32,
    /// When the most recent failure happened.
    pub last_failed_at: Option<DateTime<Utc>>,
    /// Account locked until this time, if engaged.
    pub locked_until: Option<DateTime<Utc>>,
}

/// Counting store keyed by user id.
#[async_trait]
pub trait LockoutStore: Send + Sync + 'static {
    /// Read the current state for an account.
    async fn load(&self, user_id: Uuid) -> AppResult<LockoutState>;

    /// Record one failure and return the resulting counter.
    ///
    /// The counter restarts at 1 when the previous failure predates
    /// `window_start`; implementations must apply the restart and the
    /// increment as one atomic step.
    async fn record_failure(&self, user_id: Uuid, window_start: DateTime<Utc>) -> AppResult<u32>;

    /// Engage the lock until the given instant.
    async fn lock(&self, user_id: Uuid, until: DateTime<Utc>) -> AppResult<()>;

    /// Clear the counter and any lock.
    async fn reset(&self, user_id: Uuid) -> AppResult<()>;
}

#[async_trait]
impl LockoutStore for UserRepository {
    async fn load(&self, user_id: Uuid) -> AppResult<LockoutState> {
        let user = self
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| shelfwise_core::AppError::not_found("User not found"))?;

        Ok(LockoutState {
            failed_attempts: user.failed_login_attempts.max(0) as u32,
            last_failed_at: user.last_failed_login,
            locked_until: user.locked_until,
        })
    }

    async fn record_failure(&self, user_id: Uuid, window_start: DateTime<Utc>) -> AppResult<u32> {
        let attempts = self.record_failed_attempt(user_id, window_start).await?;
        Ok(attempts.max(0) as u32)
    }

    async fn lock(&self, user_id: Uuid, until: DateTime<Utc>) -> AppResult<()> {
        self.lock_until(user_id, until).await
    }

    async fn reset(&self, user_id: Uuid) -> AppResult<()> {
        self.reset_lockout(user_id).await
    }
}
