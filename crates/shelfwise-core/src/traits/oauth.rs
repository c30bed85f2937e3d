//! OAuth code-exchange collaborator contract.
//!
//! The provider's authorization-server protocol (including the anti-CSRF
//! state check) lives entirely behind this trait; the identity core only
//! ever sees the already-verified identity triple.

use async_trait::async_trait;

use crate::result::AppResult;

/// A verified identity returned by an external provider.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProviderIdentity {
    /// Provider name, e.g. `"github"`.
    pub provider: String,
    /// Provider-assigned stable user id.
    pub provider_user_id: String,
    /// Primary email address, already verified by the provider.
    pub email: String,
    /// Username hint for new-account creation.
    pub username_hint: Option<String>,
}

/// Trait for OAuth client implementations.
#[async_trait]
pub trait OAuthProvider: Send + Sync + 'static {
    /// Exchange an authorization code for the provider identity.
    async fn exchange(&self, authorization_code: &str) -> AppResult<ProviderIdentity>;
}
