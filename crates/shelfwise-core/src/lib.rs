//! # shelfwise-core
//!
//! Core crate for Shelfwise Identity. Contains configuration schemas,
//! collaborator traits (mail delivery, OAuth code exchange), pagination
//! types, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Shelfwise crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
