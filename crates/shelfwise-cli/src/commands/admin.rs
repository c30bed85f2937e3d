//! Admin account management commands.

use clap::{Args, Subcommand};
use sqlx::PgPool;

use shelfwise_auth::password::{PasswordHasher, PasswordValidator};
use shelfwise_core::error::AppError;
use shelfwise_database::repositories::{RefreshTokenRepository, UserRepository};
use shelfwise_entity::user::model::CreateUser;
use shelfwise_entity::user::UserRole;

use crate::output;

/// Arguments for admin commands
#[derive(Debug, Args)]
pub struct AdminArgs {
    /// Admin subcommand
    #[command(subcommand)]
    pub command: AdminCommand,
}

/// Admin subcommands
#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    /// Create a new admin account
    Create {
        /// Username
        #[arg(short, long)]
        username: Option<String>,
        /// Email
        #[arg(short, long)]
        email: Option<String>,
        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Reset a user's password and revoke their sessions
    ResetPassword {
        /// Username of the account
        #[arg(short, long)]
        username: String,
        /// New password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },
}

/// Execute admin commands
pub async fn execute(args: &AdminArgs, config_path: &str) -> Result<(), AppError> {
    let config = super::load_config(config_path).await?;
    let pool: PgPool = super::create_db_pool(&config).await?;
    let user_repo = UserRepository::new(pool.clone());
    let token_repo = RefreshTokenRepository::new(pool.clone());
    let hasher = PasswordHasher::new();
    let validator = PasswordValidator::new(&config.auth);

    match &args.command {
        AdminCommand::Create {
            username,
            email,
            password,
        } => {
            let username = match username {
                Some(u) => u.clone(),
                None => dialoguer::Input::new()
                    .with_prompt("Admin username")
                    .interact_text()
                    .map_err(|e| AppError::internal(format!("Input error: {}", e)))?,
            };

            let email: String = match email {
                Some(e) => e.clone(),
                None => dialoguer::Input::new()
                    .with_prompt("Admin email")
                    .interact_text()
                    .map_err(|e| AppError::internal(format!("Input error: {}", e)))?,
            };

            let password = prompt_password(password, &validator)?;
            let password_hash = hasher.hash_password(&password)?;

            let user = user_repo
                .insert(&CreateUser {
                    username: username.trim().to_string(),
                    email: email.trim().to_lowercase(),
                    password_hash: Some(password_hash),
                    role: UserRole::Admin,
                    // Bootstrap admins skip the verification mail loop.
                    is_verified: true,
                    oauth_provider: None,
                    oauth_provider_id: None,
                    verification_token: None,
                    verification_token_expires_at: None,
                })
                .await?;

            output::print_success("Admin account created.");
            output::print_kv("id", &user.id.to_string());
            output::print_kv("username", &user.username);
            output::print_kv("email", &user.email);
        }

        AdminCommand::ResetPassword { username, password } => {
            let user = user_repo
                .find_by_username(username)
                .await?
                .ok_or_else(|| AppError::not_found(format!("No such user: {username}")))?;

            let password = prompt_password(password, &validator)?;
            let password_hash = hasher.hash_password(&password)?;

            user_repo.update_password(user.id, &password_hash).await?;
            let revoked = token_repo.revoke_all_for_user(user.id).await?;

            output::print_success(&format!(
                "Password reset for '{}'; {revoked} refresh token(s) revoked.",
                user.username
            ));
        }
    }

    Ok(())
}

/// Take the password from the flag or prompt for it, then enforce policy.
fn prompt_password(
    provided: &Option<String>,
    validator: &PasswordValidator,
) -> Result<String, AppError> {
    let password = match provided {
        Some(p) => p.clone(),
        None => dialoguer::Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {}", e)))?,
    };

    validator.validate(&password)?;
    Ok(password)
}
