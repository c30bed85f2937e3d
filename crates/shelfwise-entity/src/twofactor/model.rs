//! Backup code entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A single-use 2FA fallback code.
///
/// Only the Argon2id hash is stored; the plaintext batch is shown to the
/// user exactly once at enrollment. Consumption is irreversible.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BackupCode {
    /// Surrogate primary key.
    pub id: i64,
    /// Owning user.
    pub user_id: Uuid,
    /// Argon2id hash of the code.
    #[serde(skip_serializing)]
    pub code_hash: String,
    /// When the code was spent. `None` while still usable.
    pub consumed_at: Option<DateTime<Utc>>,
    /// When the code was issued.
    pub created_at: DateTime<Utc>,
}

impl BackupCode {
    /// Check whether the code is still usable.
    pub fn is_available(&self) -> bool {
        self.consumed_at.is_none()
    }
}
