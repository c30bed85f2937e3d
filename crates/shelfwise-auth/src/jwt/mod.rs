//! Stateless access tokens.
//!
//! Access tokens are self-contained signed assertions verified purely by
//! signature and expiry, with no database lookup. Revocation granularity
//! lives in the refresh token ledger instead; access tokens simply stay
//! short-lived.

pub mod claims;
pub mod decoder;
pub mod encoder;

pub use claims::Claims;
pub use decoder::AccessTokenDecoder;
pub use encoder::{AccessToken, AccessTokenEncoder};
