//! GitHub implementation of the OAuth code-exchange contract.
//!
//! Authorization-request routing and the state-nonce check belong to the
//! HTTP layer; this client only turns an already-delivered authorization
//! code into a verified identity triple.

use async_trait::async_trait;
use serde::Deserialize;

use shelfwise_core::config::oauth::GithubOAuthConfig;
use shelfwise_core::error::AppError;
use shelfwise_core::result::AppResult;
use shelfwise_core::traits::oauth::{OAuthProvider, ProviderIdentity};

const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const USER_URL: &str = "https://api.github.com/user";
const EMAILS_URL: &str = "https://api.github.com/user/emails";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    id: i64,
    login: String,
}

#[derive(Debug, Deserialize)]
struct GithubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

/// Exchanges GitHub authorization codes for verified identities.
#[derive(Debug, Clone)]
pub struct GithubOAuthClient {
    /// Shared HTTP client.
    http: reqwest::Client,
    /// Application credentials.
    config: GithubOAuthConfig,
}

impl GithubOAuthClient {
    /// Creates a new client from provider configuration.
    pub fn new(config: GithubOAuthConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            // GitHub's API rejects requests without a User-Agent.
            .user_agent("shelfwise-identity")
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    async fn fetch_access_token(&self, code: &str) -> AppResult<String> {
        let response: TokenResponse = self
            .http
            .post(TOKEN_URL)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::external_service(format!("GitHub token exchange failed: {e}")))?
            .json()
            .await
            .map_err(|e| {
                AppError::external_service(format!("GitHub token response malformed: {e}"))
            })?;

        response.access_token.ok_or_else(|| {
            AppError::external_service("GitHub refused the authorization code")
        })
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        access_token: &str,
    ) -> AppResult<T> {
        self.http
            .get(url)
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AppError::external_service(format!("GitHub API request failed: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::external_service(format!("GitHub API response malformed: {e}")))
    }
}

#[async_trait]
impl OAuthProvider for GithubOAuthClient {
    async fn exchange(&self, authorization_code: &str) -> AppResult<ProviderIdentity> {
        let access_token = self.fetch_access_token(authorization_code).await?;

        let user: GithubUser = self.fetch_json(USER_URL, &access_token).await?;
        let emails: Vec<GithubEmail> = self.fetch_json(EMAILS_URL, &access_token).await?;

        let primary_email = emails
            .into_iter()
            .find(|e| e.primary && e.verified)
            .map(|e| e.email)
            .ok_or_else(|| {
                AppError::external_service("GitHub account has no verified primary email")
            })?;

        Ok(ProviderIdentity {
            provider: "github".to_string(),
            provider_user_id: user.id.to_string(),
            email: primary_email,
            username_hint: Some(user.login),
        })
    }
}
