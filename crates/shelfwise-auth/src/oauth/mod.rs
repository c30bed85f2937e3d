//! External identity resolution and provider clients.

pub mod github;
pub mod linker;

pub use github::GithubOAuthClient;
pub use linker::OAuthLinker;
