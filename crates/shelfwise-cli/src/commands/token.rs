//! Refresh token maintenance commands.

use clap::{Args, Subcommand};

use shelfwise_core::error::AppError;
use shelfwise_database::repositories::{RefreshTokenRepository, UserRepository};

use crate::output;

/// Arguments for token commands
#[derive(Debug, Args)]
pub struct TokenArgs {
    /// Token subcommand
    #[command(subcommand)]
    pub command: TokenCommand,
}

/// Token subcommands
#[derive(Debug, Subcommand)]
pub enum TokenCommand {
    /// Delete refresh tokens past their expiry
    Prune,
    /// Revoke every refresh token a user holds
    RevokeAll {
        /// Username of the account
        #[arg(short, long)]
        username: String,
    },
}

/// Execute token commands
pub async fn execute(args: &TokenArgs, config_path: &str) -> Result<(), AppError> {
    let config = super::load_config(config_path).await?;
    let pool = super::create_db_pool(&config).await?;
    let token_repo = RefreshTokenRepository::new(pool.clone());

    match &args.command {
        TokenCommand::Prune => {
            let removed = token_repo.delete_expired().await?;
            output::print_success(&format!("Pruned {removed} expired refresh token(s)."));
        }

        TokenCommand::RevokeAll { username } => {
            let user_repo = UserRepository::new(pool);
            let user = user_repo
                .find_by_username(username)
                .await?
                .ok_or_else(|| AppError::not_found(format!("No such user: {username}")))?;

            let revoked = token_repo.revoke_all_for_user(user.id).await?;
            output::print_success(&format!(
                "Revoked {revoked} refresh token(s) for '{}'.",
                user.username
            ));
        }
    }

    Ok(())
}
