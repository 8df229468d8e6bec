//! Role and ownership checks.
//!
//! Role checks run as middleware (`require_roles`); ownership checks are
//! called by handlers once they have loaded the resource.

use kernel::id::AccountId;

use crate::application::config::OwnershipPolicy;
use crate::domain::entity::AuthenticatedIdentity;
use crate::domain::value_object::Role;
use crate::error::{AuthError, AuthResult};

pub fn ensure_role(identity: &AuthenticatedIdentity, allowed: &[Role]) -> AuthResult<()> {
    if identity.role.is_any_of(allowed) {
        Ok(())
    } else {
        Err(AuthError::insufficient_permissions())
    }
}

/// Reject unless `identity` owns the resource.
///
/// `denial` is the public message, e.g. "You can only update your own tasks".
pub fn ensure_owner(
    identity: &AuthenticatedIdentity,
    owner: AccountId,
    policy: OwnershipPolicy,
    denial: &'static str,
) -> AuthResult<()> {
    if identity.owns(owner) {
        return Ok(());
    }
    if policy.admin_bypass && identity.role.is_admin() {
        tracing::info!(
            account_id = %identity.id,
            owner_id = %owner,
            "Administrator acting on another account's resource"
        );
        return Ok(());
    }
    Err(AuthError::forbidden(denial))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures::identity;

    const DENIAL: &str = "You can only update your own tasks";

    #[test]
    fn test_ensure_role() {
        assert!(ensure_role(&identity(1, Role::Admin), &[Role::Admin]).is_ok());
        assert!(ensure_role(&identity(1, Role::Manager), &[Role::Admin, Role::Manager]).is_ok());

        let err = ensure_role(&identity(1, Role::User), &[Role::Admin]).unwrap_err();
        assert!(matches!(err, AuthError::Forbidden(ref m) if m == "Insufficient permissions"));
    }

    #[test]
    fn test_owner_passes() {
        let me = identity(5, Role::User);
        assert!(ensure_owner(&me, AccountId::new(5), OwnershipPolicy::STRICT, DENIAL).is_ok());
    }

    #[test]
    fn test_non_owner_forbidden() {
        let me = identity(5, Role::User);
        let err = ensure_owner(&me, AccountId::new(6), OwnershipPolicy::STRICT, DENIAL).unwrap_err();
        assert_eq!(err.to_string(), DENIAL);
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_admin_not_exempt_under_strict_policy() {
        let admin = identity(1, Role::Admin);
        assert!(ensure_owner(&admin, AccountId::new(6), OwnershipPolicy::STRICT, DENIAL).is_err());
    }

    #[test]
    fn test_admin_bypass_when_enabled() {
        let policy = OwnershipPolicy { admin_bypass: true };
        assert!(ensure_owner(&identity(1, Role::Admin), AccountId::new(6), policy, DENIAL).is_ok());
        assert!(ensure_owner(&identity(2, Role::Manager), AccountId::new(6), policy, DENIAL).is_err());
    }
}
