//! Administrative user management — listing, role changes, activation.
//!
//! Every operation opens with an explicit [`RbacEnforcer`] call; there
//! is no route-level annotation to rely on.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use shelfwise_core::error::AppError;
use shelfwise_core::types::pagination::{PageRequest, PageResponse};
use shelfwise_database::repositories::UserRepository;
use shelfwise_entity::user::{User, UserRole};

use crate::error::{AuthError, AuthResult};
use crate::rbac::RbacEnforcer;

/// Handles moderator/admin user management operations.
#[derive(Debug, Clone)]
pub struct UserAdminService {
    /// User repository.
    user_repo: Arc<UserRepository>,
    /// RBAC enforcer.
    rbac: Arc<RbacEnforcer>,
}

impl UserAdminService {
    /// Creates a new admin service.
    pub fn new(user_repo: Arc<UserRepository>, rbac: Arc<RbacEnforcer>) -> Self {
        Self { user_repo, rbac }
    }

    /// Lists all users with pagination. Admin only.
    pub async fn list_users(
        &self,
        actor: &User,
        page: &PageRequest,
    ) -> AuthResult<PageResponse<User>> {
        self.rbac.require(actor, UserRole::Admin)?;

        Ok(self.user_repo.find_all(page).await?)
    }

    /// Fetches a single user by id. Requires a verified account.
    pub async fn get_user(&self, actor: &User, user_id: Uuid) -> AuthResult<User> {
        self.rbac.require(actor, UserRole::User)?;
        self.rbac.require_verified(actor)?;

        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found").into())
    }

    /// Changes a user's role. Admin only.
    pub async fn set_role(
        &self,
        actor: &User,
        user_id: Uuid,
        role: UserRole,
    ) -> AuthResult<()> {
        self.rbac.require(actor, UserRole::Admin)?;

        self.user_repo.set_role(user_id, role).await?;
        info!(
            actor_id = %actor.id,
            user_id = %user_id,
            role = %role,
            "User role updated"
        );
        Ok(())
    }

    /// Deactivates an account. Moderator or above; nobody deactivates
    /// themselves.
    pub async fn deactivate(&self, actor: &User, user_id: Uuid) -> AuthResult<()> {
        self.rbac.require(actor, UserRole::Moderator)?;

        if actor.id == user_id {
            return Err(AuthError::Forbidden(
                "Cannot deactivate your own account".to_string(),
            ));
        }

        self.user_repo.set_active(user_id, false).await?;
        info!(actor_id = %actor.id, user_id = %user_id, "User deactivated");
        Ok(())
    }

    /// Reactivates an account. Moderator or above.
    pub async fn activate(&self, actor: &User, user_id: Uuid) -> AuthResult<()> {
        self.rbac.require(actor, UserRole::Moderator)?;

        self.user_repo.set_active(user_id, true).await?;
        info!(actor_id = %actor.id, user_id = %user_id, "User reactivated");
        Ok(())
    }
}
