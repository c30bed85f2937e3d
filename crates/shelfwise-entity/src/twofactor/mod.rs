//! Two-factor backup code entity.

pub mod model;

pub use model::BackupCode;
