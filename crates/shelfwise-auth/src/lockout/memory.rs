//! In-memory lockout store.
//!
//! Used by tests and single-process tools. Accounts the store has never
//! seen read back as zeroed state.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use shelfwise_core::result::AppResult;

use super::store::{LockoutState, LockoutStore};

/// Lockout counters held in a process-local map.
#[derive(Debug, Default)]
pub struct InMemoryLockoutStore {
    entries: Mutex<HashMap<Uuid, LockoutState>>,
}

impl InMemoryLockoutStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LockoutStore for InMemoryLockoutStore {
    async fn load(&self, user_id: Uuid) -> AppResult<LockoutState> {
        let entries = self.entries.lock().await;
        Ok(entries.get(&user_id).copied().unwrap_or_default())
    }

    async fn record_failure(&self, user_id: Uuid, window_start: DateTime<Utc>) -> AppResult<u32> {
        let mut entries = self.entries.lock().await;
        let state = entries.entry(user_id).or_default();

        let stale = state
            .last_failed_at
            .is_none_or(|last| last < window_start);
        state.failed_attempts = if stale { 1 } else { state.failed_attempts + 1 };
        state.last_failed_at = Some(Utc::now());

        Ok(state.failed_attempts)
    }

    async fn lock(&self, user_id: Uuid, until: DateTime<Utc>) -> AppResult<()> {
        let mut entries = self.entries.lock().await;
        entries.entry(user_id).or_default().locked_until = Some(until);
        Ok(())
    }

    async fn reset(&self, user_id: Uuid) -> AppResult<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(user_id, LockoutState::default());
        Ok(())
    }
}
