//! RBAC enforcement — ordered role comparison plus account-state gates.
//!
//! Protected operations call [`RbacEnforcer::require`] explicitly at
//! their entry point; there is no annotation magic.

use uuid::Uuid;

use shelfwise_entity::user::{User, UserRole};

use crate::error::AuthError;

/// Enforces role-based access control.
#[derive(Debug, Clone, Default)]
pub struct RbacEnforcer;

impl RbacEnforcer {
    /// Creates a new enforcer.
    pub fn new() -> Self {
        Self
    }

    /// Checks that the user is active and holds at least `minimum_role`.
    ///
    /// The comparison runs on the ordered privilege levels, so inserting
    /// a role later does not touch call sites.
    pub fn require(&self, user: &User, minimum_role: UserRole) -> Result<(), AuthError> {
        if !user.is_active {
            return Err(AuthError::Forbidden(
                "Account is deactivated".to_string(),
            ));
        }
        if user.role.has_at_least(&minimum_role) {
            Ok(())
        } else {
            Err(AuthError::Forbidden(format!(
                "Role '{}' is insufficient; minimum required: '{minimum_role}'",
                user.role
            )))
        }
    }

    /// Checks that the user has confirmed their email address.
    ///
    /// Callers whose policy requires verification invoke this in
    /// addition to [`require`].
    ///
    /// [`require`]: RbacEnforcer::require
    pub fn require_verified(&self, user: &User) -> Result<(), AuthError> {
        if user.is_verified {
            Ok(())
        } else {
            Err(AuthError::EmailNotVerified)
        }
    }

    /// Convenience gate for admin-only operations.
    pub fn require_admin(&self, user: &User) -> Result<(), AuthError> {
        self.require(user, UserRole::Admin)
    }

    /// Whether the user may modify a resource: owners may touch their
    /// own, admins may touch any.
    pub fn can_modify(&self, user: &User, owner_id: Uuid) -> bool {
        user.role.is_admin() || user.id == owner_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user_with(role: UserRole, is_active: bool, is_verified: bool) -> User {
        User {
            id: Uuid::new_v4(),
            username: "reader".to_string(),
            email: "reader@example.com".to_string(),
            password_hash: Some("$argon2id$stub".to_string()),
            role,
            is_active,
            is_verified,
            totp_secret: None,
            totp_enabled: false,
            oauth_provider: None,
            oauth_provider_id: None,
            failed_login_attempts: 0,
            last_failed_login: None,
            locked_until: None,
            verification_token: None,
            verification_token_expires_at: None,
            reset_token: None,
            reset_token_expires_at: None,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_gate() {
        let rbac = RbacEnforcer::new();
        let moderator = user_with(UserRole::Moderator, true, true);

        assert!(rbac.require(&moderator, UserRole::User).is_ok());
        assert!(rbac.require(&moderator, UserRole::Moderator).is_ok());
        assert!(rbac.require(&moderator, UserRole::Admin).is_err());
    }

    #[test]
    fn test_inactive_account_is_refused_regardless_of_role() {
        let rbac = RbacEnforcer::new();
        let admin = user_with(UserRole::Admin, false, true);
        assert!(rbac.require(&admin, UserRole::User).is_err());
    }

    #[test]
    fn test_verification_gate() {
        let rbac = RbacEnforcer::new();
        let unverified = user_with(UserRole::User, true, false);
        assert!(matches!(
            rbac.require_verified(&unverified),
            Err(AuthError::EmailNotVerified)
        ));
    }

    #[test]
    fn test_owner_or_admin_can_modify() {
        let rbac = RbacEnforcer::new();
        let owner = user_with(UserRole::User, true, true);
        let admin = user_with(UserRole::Admin, true, true);
        let other = user_with(UserRole::User, true, true);

        assert!(rbac.can_modify(&owner, owner.id));
        assert!(rbac.can_modify(&admin, owner.id));
        assert!(!rbac.can_modify(&other, owner.id));
    }
}
