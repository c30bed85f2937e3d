//! # shelfwise-entity
//!
//! Entity models shared by the Shelfwise Identity crates. Each module
//! maps to one persisted table plus its creation payloads.

pub mod token;
pub mod twofactor;
pub mod user;

pub use token::RefreshToken;
pub use twofactor::BackupCode;
pub use user::{User, UserRole};
