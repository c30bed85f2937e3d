//! Repository implementations for the Shelfwise Identity entities.

pub mod backup_code;
pub mod refresh_token;
pub mod user;

pub use backup_code::BackupCodeRepository;
pub use refresh_token::RefreshTokenRepository;
pub use user::UserRepository;

use shelfwise_core::error::{AppError, ErrorKind};

/// Map a sqlx error to the unified error type, surfacing unique-constraint
/// violations as `Conflict` so callers can report duplicates.
pub(crate) fn map_db_err(context: &str, conflict_message: &str, e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::conflict(conflict_message.to_string())
        }
        _ => AppError::with_source(ErrorKind::Database, context.to_string(), e),
    }
}
