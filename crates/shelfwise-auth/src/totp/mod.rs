//! TOTP two-factor authentication and backup codes.

pub mod manager;

pub use manager::{Enrollment, TotpManager};
