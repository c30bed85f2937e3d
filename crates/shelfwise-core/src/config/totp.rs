//! TOTP two-factor configuration.

use serde::{Deserialize, Serialize};

/// Time-based one-time-password parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotpConfig {
    /// Issuer name embedded in provisioning URIs.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// Time step in seconds.
    #[serde(default = "default_step")]
    pub step_seconds: u64,
    /// Accepted steps of clock drift on either side of now.
    #[serde(default = "default_skew")]
    pub skew_steps: u8,
    /// Number of digits in a code.
    #[serde(default = "default_digits")]
    pub digits: usize,
    /// Backup codes issued per enrollment.
    #[serde(default = "default_backup_codes")]
    pub backup_code_count: usize,
}

impl Default for TotpConfig {
    fn default() -> Self {
        Self {
            issuer: default_issuer(),
            step_seconds: default_step(),
            skew_steps: default_skew(),
            digits: default_digits(),
            backup_code_count: default_backup_codes(),
        }
    }
}

fn default_issuer() -> String {
    "Shelfwise".to_string()
}

fn default_step() -> u64 {
    30
}

fn default_skew() -> u8 {
    1
}

fn default_digits() -> usize {
    6
}

fn default_backup_codes() -> usize {
    8
}
