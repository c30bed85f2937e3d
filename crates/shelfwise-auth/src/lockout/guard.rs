//! Lockout guard — the cheap gate ahead of password verification.
//!
//! `check` runs before any hashing work on every login attempt; failures
//! are recorded only after a wrong-password (or wrong-code) result.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;
use uuid::Uuid;

use shelfwise_core::config::lockout::LockoutConfig;
use shelfwise_core::result::AppResult;
use shelfwise_entity::user::User;

use crate::error::AuthError;

use super::store::LockoutStore;

/// What recording a failure led to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LockoutOutcome {
    /// Failure counted; the account is still open.
    Counted {
        /// Attempts inside the current window.
        attempts: u32,
    },
    /// The threshold was reached and the account is now locked.
    Locked {
        /// When the lock lifts.
        until: DateTime<Utc>,
    },
}

/// Per-account brute-force protection.
#[derive(Clone)]
pub struct LockoutGuard {
    /// Counting store (users table in the default deployment).
    store: Arc<dyn LockoutStore>,
    /// Thresholds and durations.
    config: LockoutConfig,
}

impl std::fmt::Debug for LockoutGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockoutGuard")
            .field("config", &self.config)
            .finish()
    }
}

impl LockoutGuard {
    /// Creates a new guard over the given counting store.
    pub fn new(store: Arc<dyn LockoutStore>, config: LockoutConfig) -> Self {
        Self { store, config }
    }

    /// Refuse locked accounts, reporting how long the caller must wait.
    ///
    /// A lock whose expiry has passed counts as open and is cleared here
    /// so stale state does not linger on the account.
    pub async fn check(&self, user: &User) -> Result<(), AuthError> {
        if let Some(until) = user.locked_until {
            let now = Utc::now();
            if until > now {
                return Err(AuthError::AccountLocked {
                    retry_after_minutes: (until - now).num_minutes().max(1),
                });
            }
            self.store.reset(user.id).await?;
        }
        Ok(())
    }

    /// Record a failed attempt; engages the lock once the windowed
    /// counter reaches the configured threshold.
    pub async fn record_failure(&self, user_id: Uuid) -> AppResult<LockoutOutcome> {
        let window_start = Utc::now() - Duration::minutes(self.config.window_minutes as i64);
        let attempts = self.store.record_failure(user_id, window_start).await?;

        if attempts >= self.config.max_failed_attempts {
            let until = Utc::now() + Duration::minutes(self.config.lockout_minutes as i64);
            self.store.lock(user_id, until).await?;
            warn!(
                user_id = %user_id,
                attempts,
                locked_until = %until,
                "Account locked after repeated failed logins"
            );
            return Ok(LockoutOutcome::Locked { until });
        }

        Ok(LockoutOutcome::Counted { attempts })
    }

    /// Clear the counter and any lock after a successful authentication.
    pub async fn record_success(&self, user_id: Uuid) -> AppResult<()> {
        self.store.reset(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lockout::memory::InMemoryLockoutStore;
    use crate::lockout::store::LockoutState;
    use shelfwise_entity::user::UserRole;

    fn guard_with_store() -> (LockoutGuard, Arc<InMemoryLockoutStore>) {
        let store = Arc::new(InMemoryLockoutStore::new());
        let guard = LockoutGuard::new(store.clone(), LockoutConfig::default());
        (guard, store)
    }

    fn user_locked_until(until: Option<DateTime<Utc>>) -> User {
        User {
            id: Uuid::new_v4(),
            username: "reader".to_string(),
            email: "reader@example.com".to_string(),
            password_hash: Some("$argon2id$stub".to_string()),
            role: UserRole::User,
            is_active: true,
            is_verified: true,
            totp_secret: None,
            totp_enabled: false,
            oauth_provider: None,
            oauth_provider_id: None,
            failed_login_attempts: 0,
            last_failed_login: None,
            locked_until: until,
            verification_token: None,
            verification_token_expires_at: None,
            reset_token: None,
            reset_token_expires_at: None,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_threshold_engages_lock() {
        let (guard, _) = guard_with_store();
        let user_id = Uuid::new_v4();

        for attempt in 1..=4 {
            assert_eq!(
                guard.record_failure(user_id).await.unwrap(),
                LockoutOutcome::Counted { attempts: attempt }
            );
        }

        match guard.record_failure(user_id).await.unwrap() {
            LockoutOutcome::Locked { until } => assert!(until > Utc::now()),
            other => panic!("expected lock, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_check_refuses_locked_account_with_retry_after() {
        let (guard, _) = guard_with_store();
        let user = user_locked_until(Some(Utc::now() + Duration::minutes(10)));

        match guard.check(&user).await {
            Err(AuthError::AccountLocked {
                retry_after_minutes,
            }) => assert!(retry_after_minutes >= 1),
            other => panic!("expected AccountLocked, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_check_clears_expired_lock() {
        let (guard, store) = guard_with_store();
        let user = user_locked_until(Some(Utc::now() - Duration::minutes(1)));

        store.record_failure(user.id, Utc::now() - Duration::hours(1)).await.unwrap();
        store.lock(user.id, Utc::now() - Duration::minutes(1)).await.unwrap();

        assert!(guard.check(&user).await.is_ok());
        assert_eq!(store.load(user.id).await.unwrap(), LockoutState::default());
    }

    #[tokio::test]
    async fn test_stale_failures_restart_counter() {
        let (_, store) = guard_with_store();
        let user_id = Uuid::new_v4();

        let old_window = Utc::now() - Duration::hours(1);
        assert_eq!(store.record_failure(user_id, old_window).await.unwrap(), 1);
        assert_eq!(store.record_failure(user_id, old_window).await.unwrap(), 2);

        // A window that postdates the last failure wipes the carry-over.
        let fresh_window = Utc::now() + Duration::seconds(1);
        assert_eq!(store.record_failure(user_id, fresh_window).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_success_resets_counter() {
        let (guard, store) = guard_with_store();
        let user_id = Uuid::new_v4();

        guard.record_failure(user_id).await.unwrap();
        guard.record_failure(user_id).await.unwrap();
        guard.record_success(user_id).await.unwrap();

        assert_eq!(store.load(user_id).await.unwrap().failed_attempts, 0);
    }
}
