//! Outbound mail configuration.

use serde::{Deserialize, Serialize};

/// Settings for the mail delivery collaborator.
///
/// The identity core never speaks SMTP itself; these values parameterize
/// whichever [`crate::traits::Mailer`] implementation the deployment wires in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// From address used for all identity mail.
    #[serde(default = "default_from")]
    pub from_address: String,
    /// Display name on the From header.
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Base URL of the web frontend, used to build verification/reset links.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from_address: default_from(),
            from_name: default_from_name(),
            frontend_url: default_frontend_url(),
        }
    }
}

fn default_from() -> String {
    "noreply@shelfwise.dev".to_string()
}

fn default_from_name() -> String {
    "Shelfwise".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}
