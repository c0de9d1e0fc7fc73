use super::types::{Membership, RoleSet};
use crate::error::{AuthorizationReason, GateError, Result};

/// Checks a resolved membership against the roles a route accepts.
///
/// Pure: no store access, no side effects.
pub struct RoleGate;

impl RoleGate {
    pub fn check(membership: &Membership, required: &RoleSet) -> Result<()> {
        if required.contains(membership.role) {
            Ok(())
        } else {
            Err(GateError::authorization(AuthorizationReason::InsufficientRole))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::organizations::OrgRole;
    use uuid::Uuid;

    fn membership(role: OrgRole) -> Membership {
        Membership::new(Uuid::new_v4(), "user-1", role)
    }

    #[test]
    fn test_role_in_set_passes() {
        assert!(RoleGate::check(&membership(OrgRole::Admin), &RoleSet::owner_or_admin()).is_ok());
        assert!(RoleGate::check(&membership(OrgRole::Member), &RoleSet::any()).is_ok());
    }

    #[test]
    fn test_member_refused_on_admin_route() {
        let result = RoleGate::check(&membership(OrgRole::Member), &RoleSet::owner_or_admin());
        assert!(matches!(
            result,
            Err(GateError::Authorization(AuthorizationReason::InsufficientRole))
        ));
    }

    #[test]
    fn test_set_membership_not_hierarchy() {
        // an owner is refused where only members are accepted
        let members_only = RoleSet::of(&[OrgRole::Member]);
        assert!(RoleGate::check(&membership(OrgRole::Owner), &members_only).is_err());
    }
}
