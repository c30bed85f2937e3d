//! CLI command definitions and dispatch.

pub mod admin;
pub mod migrate;
pub mod token;
pub mod user;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use shelfwise_core::error::AppError;

/// Shelfwise Identity — account and session administration
#[derive(Debug, Parser)]
#[command(name = "shelfwise", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Admin account management
    Admin(admin::AdminArgs),
    /// User management
    User(user::UserArgs),
    /// Refresh token maintenance
    Token(token::TokenArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &self.config).await,
            Commands::Admin(args) => admin::execute(args, &self.config).await,
            Commands::User(args) => user::execute(args, &self.config, self.format).await,
            Commands::Token(args) => token::execute(args, &self.config).await,
        }
    }
}

/// Helper: load configuration from file
pub async fn load_config(config_path: &str) -> Result<shelfwise_core::config::AppConfig, AppError> {
    shelfwise_core::config::AppConfig::load(config_path)
}

/// Helper: create database pool from config
pub async fn create_db_pool(
    config: &shelfwise_core::config::AppConfig,
) -> Result<sqlx::PgPool, AppError> {
    let pool = shelfwise_database::connection::DatabasePool::connect(&config.database).await?;
    Ok(pool.into_pool())
}
