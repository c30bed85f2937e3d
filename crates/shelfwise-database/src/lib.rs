//! # shelfwise-database
//!
//! PostgreSQL connection management and concrete repository
//! implementations for the Shelfwise Identity entities.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
