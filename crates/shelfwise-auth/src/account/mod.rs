//! Account credentials: registration, password verification, and the
//! verification/recovery token lifecycles.

pub mod admin;
pub mod recovery;
pub mod store;

pub use admin::UserAdminService;
pub use recovery::AccountRecovery;
pub use store::{AccountStore, RegisterRequest};
