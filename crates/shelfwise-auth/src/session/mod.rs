//! Session lifecycle: the refresh token ledger and the login flows.

pub mod ledger;
pub mod manager;

pub use ledger::{IssuedRefreshToken, RedeemedToken, RefreshTokenLedger};
pub use manager::{AuthSessionManager, LoginRequest, LoginResult, SessionTokens};
