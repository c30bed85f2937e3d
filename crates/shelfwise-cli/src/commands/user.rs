//! User management commands.

use clap::{Args, Subcommand};
use tabled::Tabled;

use shelfwise_core::error::AppError;
use shelfwise_core::types::pagination::PageRequest;
use shelfwise_database::repositories::UserRepository;
use shelfwise_entity::user::{User, UserRole};

use crate::output;
use crate::output::OutputFormat;

/// Arguments for user commands
#[derive(Debug, Args)]
pub struct UserArgs {
    /// User subcommand
    #[command(subcommand)]
    pub command: UserCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// List users
    List {
        /// Page number (1-based)
        #[arg(long, default_value_t = 1)]
        page: u64,
        /// Items per page
        #[arg(long, default_value_t = 25)]
        page_size: u64,
    },
    /// Change a user's role
    SetRole {
        /// Username of the account
        #[arg(short, long)]
        username: String,
        /// New role: admin, moderator, or user
        #[arg(short, long)]
        role: UserRole,
    },
    /// Reactivate an account
    Activate {
        /// Username of the account
        #[arg(short, long)]
        username: String,
    },
    /// Deactivate an account
    Deactivate {
        /// Username of the account
        #[arg(short, long)]
        username: String,
    },
}

/// One row in the user listing.
#[derive(Debug, Tabled, serde::Serialize)]
struct UserRow {
    username: String,
    email: String,
    role: String,
    active: bool,
    verified: bool,
    #[tabled(rename = "2fa")]
    two_factor: bool,
    created: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.to_string(),
            active: user.is_active,
            verified: user.is_verified,
            two_factor: user.totp_enabled,
            created: user.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Execute user commands
pub async fn execute(
    args: &UserArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path).await?;
    let pool = super::create_db_pool(&config).await?;
    let user_repo = UserRepository::new(pool);

    match &args.command {
        UserCommand::List { page, page_size } => {
            let page = user_repo
                .find_all(&PageRequest::new(*page, *page_size))
                .await?;
            let rows: Vec<UserRow> = page.items.iter().map(UserRow::from).collect();
            output::print_list(&rows, format);
            println!(
                "Page {}/{} ({} users total)",
                page.page, page.total_pages, page.total_items
            );
        }

        UserCommand::SetRole { username, role } => {
            let user = find_user(&user_repo, username).await?;
            user_repo.set_role(user.id, *role).await?;
            output::print_success(&format!("Role of '{}' set to {role}.", user.username));
        }

        UserCommand::Activate { username } => {
            let user = find_user(&user_repo, username).await?;
            user_repo.set_active(user.id, true).await?;
            output::print_success(&format!("Account '{}' activated.", user.username));
        }

        UserCommand::Deactivate { username } => {
            let user = find_user(&user_repo, username).await?;
            user_repo.set_active(user.id, false).await?;
            output::print_success(&format!("Account '{}' deactivated.", user.username));
        }
    }

    Ok(())
}

async fn find_user(user_repo: &UserRepository, username: &str) -> Result<User, AppError> {
    user_repo
        .find_by_username(username)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No such user: {username}")))
}
