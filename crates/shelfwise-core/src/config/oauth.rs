//! External identity provider configuration.

use serde::{Deserialize, Serialize};

/// OAuth client credentials for social login providers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// GitHub provider settings (absent disables GitHub login).
    #[serde(default)]
    pub github: Option<GithubOAuthConfig>,
}

/// GitHub OAuth application credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubOAuthConfig {
    /// OAuth application client id.
    pub client_id: String,
    /// OAuth application client secret.
    pub client_secret: String,
    /// Redirect URI registered with the provider.
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
}

fn default_redirect_uri() -> String {
    "http://localhost:8000/oauth/github/callback".to_string()
}
