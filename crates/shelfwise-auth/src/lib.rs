//! # shelfwise-auth
//!
//! Credential and session lifecycle for the Shelfwise platform.
//!
//! ## Modules
//!
//! - `account` — registration, password verification, email verification,
//!   password recovery
//! - `password` — Argon2id hashing and password policy enforcement
//! - `jwt` — stateless access-token encoding and validation
//! - `session` — refresh token ledger and the login/refresh/logout flows
//! - `lockout` — failed-attempt counting and temporal account lockout
//! - `totp` — TOTP two-factor enrollment, verification, and backup codes
//! - `oauth` — external identity resolution and the GitHub code exchange
//! - `rbac` — role-based authorization checks

pub mod account;
pub mod error;
pub mod jwt;
pub mod lockout;
pub mod oauth;
pub mod password;
pub mod rbac;
pub mod secrets;
pub mod session;
pub mod totp;

pub use account::{AccountRecovery, AccountStore, RegisterRequest, UserAdminService};
pub use error::{AuthError, AuthResult};
pub use jwt::{AccessTokenDecoder, AccessTokenEncoder, Claims};
pub use lockout::{InMemoryLockoutStore, LockoutGuard, LockoutStore};
pub use oauth::{GithubOAuthClient, OAuthLinker};
pub use password::{PasswordHasher, PasswordValidator};
pub use rbac::RbacEnforcer;
pub use session::{AuthSessionManager, RefreshTokenLedger, SessionTokens};
pub use totp::TotpManager;
