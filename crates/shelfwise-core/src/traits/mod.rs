//! Collaborator traits defined in `shelfwise-core` and implemented elsewhere.

pub mod mailer;
pub mod oauth;

pub use mailer::{LogMailer, MailKind, Mailer};
pub use oauth::{OAuthProvider, ProviderIdentity};
