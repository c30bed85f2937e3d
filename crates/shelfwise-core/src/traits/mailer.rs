//! Outbound mail collaborator contract.
//!
//! The identity core never blocks on delivery: implementations promise
//! best-effort delivery only, and callers treat send failures as
//! non-fatal.

use async_trait::async_trait;

use crate::result::AppResult;

/// The mail templates the identity core can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailKind {
    /// Email address verification link.
    Verification,
    /// Password reset link.
    PasswordReset,
    /// Notice that the password was changed.
    PasswordChanged,
    /// Notice that a 2FA backup code was consumed.
    BackupCodeUsed,
}

/// Trait for mail delivery backends (SMTP relay, API provider, or a
/// logging stub in tests and development).
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    /// Request delivery of the given template to `recipient`.
    ///
    /// `token` carries the verification/reset token for templates that
    /// embed a link; notification templates pass `None`.
    async fn send(&self, recipient: &str, kind: MailKind, token: Option<&str>) -> AppResult<()>;
}

/// Mailer that records requests to the log instead of delivering them.
///
/// Default wiring for the CLI and for tests.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, recipient: &str, kind: MailKind, token: Option<&str>) -> AppResult<()> {
        tracing::info!(
            recipient = %recipient,
            kind = ?kind,
            has_token = token.is_some(),
            "Mail delivery requested"
        );
        Ok(())
    }
}
