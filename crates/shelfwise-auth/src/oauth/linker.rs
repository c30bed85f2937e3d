//! Maps a verified provider identity onto a local account.
//!
//! The authorization-code exchange and anti-CSRF state check happen in
//! the [`OAuthProvider`] collaborator before this code ever runs; the
//! linker only consumes the verified (provider, provider_user_id, email)
//! triple. The unique index on that pair is the authoritative guard
//! against concurrent callbacks creating duplicate accounts.
//!
//! [`OAuthProvider`]: shelfwise_core::traits::OAuthProvider

use std::sync::Arc;

use tracing::info;

use shelfwise_core::error::ErrorKind;
use shelfwise_core::traits::oauth::ProviderIdentity;
use shelfwise_database::repositories::UserRepository;
use shelfwise_entity::user::model::CreateUser;
use shelfwise_entity::user::{User, UserRole};

use crate::error::{AuthError, AuthResult};
use crate::secrets::generate_hex_suffix;

/// Resolves provider identities to local users, creating or linking
/// accounts as needed.
#[derive(Debug, Clone)]
pub struct OAuthLinker {
    /// User repository.
    user_repo: Arc<UserRepository>,
}

impl OAuthLinker {
    /// Creates a new linker.
    pub fn new(user_repo: Arc<UserRepository>) -> Self {
        Self { user_repo }
    }

    /// Find the local account for a provider identity.
    ///
    /// Resolution order:
    /// 1. an account already linked to this exact identity;
    /// 2. an unlinked account with the same email, which gets linked
    ///    (an account linked to a *different* provider is never
    ///    overwritten);
    /// 3. a fresh account with no password and a pre-verified email
    ///    (the provider vouched for it).
    pub async fn resolve(&self, identity: &ProviderIdentity) -> AuthResult<User> {
        if let Some(user) = self
            .user_repo
            .find_by_oauth_identity(&identity.provider, &identity.provider_user_id)
            .await?
        {
            return Ok(user);
        }

        let email = identity.email.trim().to_lowercase();

        if let Some(user) = self.user_repo.find_by_email(&email).await? {
            return self.link_existing(user, identity).await;
        }

        self.create_account(identity, &email).await
    }

    /// Merge the identity into an existing unlinked account.
    async fn link_existing(&self, user: User, identity: &ProviderIdentity) -> AuthResult<User> {
        if let (Some(provider), Some(provider_id)) =
            (&user.oauth_provider, &user.oauth_provider_id)
        {
            if provider == &identity.provider && provider_id == &identity.provider_user_id {
                return Ok(user);
            }
            return Err(AuthError::Conflict(
                "Account is already linked to a different provider".to_string(),
            ));
        }

        match self
            .user_repo
            .link_oauth_identity(user.id, &identity.provider, &identity.provider_user_id)
            .await
        {
            Ok(true) => {
                info!(
                    user_id = %user.id,
                    provider = %identity.provider,
                    "Linked provider identity to existing account"
                );
                self.reload(user.id).await
            }
            // A concurrent callback linked this account first; accept the
            // result if it linked the same identity.
            Ok(false) => {
                let current = self.reload(user.id).await?;
                if current.oauth_provider.as_deref() == Some(identity.provider.as_str())
                    && current.oauth_provider_id.as_deref()
                        == Some(identity.provider_user_id.as_str())
                {
                    Ok(current)
                } else {
                    Err(AuthError::Conflict(
                        "Account is already linked to a different provider".to_string(),
                    ))
                }
            }
            // The unique index caught another account claiming this
            // identity in parallel; defer to whoever won.
            Err(e) if e.kind == ErrorKind::Conflict => self.find_claimed(identity).await,
            Err(e) => Err(e.into()),
        }
    }

    /// Create a new OAuth-only account for the identity.
    async fn create_account(
        &self,
        identity: &ProviderIdentity,
        email: &str,
    ) -> AuthResult<User> {
        let base_username = identity
            .username_hint
            .as_deref()
            .unwrap_or_else(|| email.split('@').next().unwrap_or("member"))
            .trim()
            .to_string();

        let mut username = base_username.clone();
        for attempt in 0..2 {
            let create = CreateUser {
                username: username.clone(),
                email: email.to_string(),
                password_hash: None,
                role: UserRole::User,
                // The provider has already verified this address.
                is_verified: true,
                oauth_provider: Some(identity.provider.clone()),
                oauth_provider_id: Some(identity.provider_user_id.clone()),
                verification_token: None,
                verification_token_expires_at: None,
            };

            match self.user_repo.insert(&create).await {
                Ok(user) => {
                    info!(
                        user_id = %user.id,
                        provider = %identity.provider,
                        "Created account from provider identity"
                    );
                    return Ok(user);
                }
                Err(e) if e.kind == ErrorKind::Conflict => {
                    // A parallel callback may have created the account
                    // for this same identity; if so, that row wins.
                    if let Some(user) = self
                        .user_repo
                        .find_by_oauth_identity(&identity.provider, &identity.provider_user_id)
                        .await?
                    {
                        return Ok(user);
                    }
                    if attempt == 0 {
                        // Username squatted: retry once with a suffix.
                        username = format!("{base_username}_{}", generate_hex_suffix());
                        continue;
                    }
                    return Err(AuthError::Conflict(
                        "Email is already registered".to_string(),
                    ));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AuthError::Conflict("Email is already registered".to_string()))
    }

    /// Return whichever account now holds the identity.
    async fn find_claimed(&self, identity: &ProviderIdentity) -> AuthResult<User> {
        self.user_repo
            .find_by_oauth_identity(&identity.provider, &identity.provider_user_id)
            .await?
            .ok_or_else(|| {
                AuthError::Conflict(
                    "Provider identity is already linked to another account".to_string(),
                )
            })
    }

    async fn reload(&self, user_id: uuid::Uuid) -> AuthResult<User> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::Unauthorized)
    }
}
