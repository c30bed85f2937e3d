//! Failed-login lockout configuration.

use serde::{Deserialize, Serialize};

/// Brute-force protection thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockoutConfig {
    /// Failed attempts within the window before the account locks.
    #[serde(default = "default_max_attempts")]
    pub max_failed_attempts: u32,
    /// Rolling window in minutes; older failures do not count.
    #[serde(default = "default_window")]
    pub window_minutes: u64,
    /// How long a locked account stays locked, in minutes.
    #[serde(default = "default_lockout")]
    pub lockout_minutes: u64,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: default_max_attempts(),
            window_minutes: default_window(),
            lockout_minutes: default_lockout(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_window() -> u64 {
    15
}

fn default_lockout() -> u64 {
    30
}
