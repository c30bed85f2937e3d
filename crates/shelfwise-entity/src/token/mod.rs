//! Refresh token entity.

pub mod refresh;

pub use refresh::{CreateRefreshToken, RefreshToken};
