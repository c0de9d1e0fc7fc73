//! Membership resolution for organization-scoped routes.

use super::storage::{MembershipStore, OrganizationStore};
use super::types::Membership;
use crate::auth::Identity;
use crate::error::{AuthorizationReason, GateError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// How a route answers a caller who is not a member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgVisibility {
    /// Always `not_a_member`; whether the organization exists is never
    /// disclosed and the organization store is not consulted.
    #[default]
    Conceal,
    /// `NotFound` when the organization does not exist, `not_a_member`
    /// otherwise.
    Reveal,
}

/// Looks up the caller's membership in the addressed organization.
#[derive(Clone)]
pub struct MembershipResolver {
    memberships: Arc<dyn MembershipStore>,
    organizations: Arc<dyn OrganizationStore>,
    default_visibility: OrgVisibility,
}

impl MembershipResolver {
    pub fn new(memberships: Arc<dyn MembershipStore>, organizations: Arc<dyn OrganizationStore>) -> Self {
        Self {
            memberships,
            organizations,
            default_visibility: OrgVisibility::Conceal,
        }
    }

    /// Visibility used by routes that do not choose one.
    #[must_use]
    pub fn with_default_visibility(mut self, visibility: OrgVisibility) -> Self {
        self.default_visibility = visibility;
        self
    }

    pub fn default_visibility(&self) -> OrgVisibility {
        self.default_visibility
    }

    pub fn memberships(&self) -> &Arc<dyn MembershipStore> {
        &self.memberships
    }

    pub fn organizations(&self) -> &Arc<dyn OrganizationStore> {
        &self.organizations
    }

    /// Resolves `identity`'s membership in `org_id`.
    ///
    /// # Errors
    ///
    /// - `Authorization(NotAMember)` when there is no membership
    /// - `NotFound` when there is no membership, the organization does not
    ///   exist and visibility is [`OrgVisibility::Reveal`]
    /// - `Internal` when a store lookup fails
    pub async fn resolve(
        &self,
        identity: &Identity,
        org_id: Uuid,
        visibility: Option<OrgVisibility>,
    ) -> Result<Membership> {
        let membership = self
            .memberships
            .find_membership(org_id, identity.id())
            .await
            .map_err(|e| GateError::internal(format!("Failed to load membership: {e}")))?;

        if let Some(membership) = membership {
            return Ok(membership);
        }

        if visibility.unwrap_or(self.default_visibility) == OrgVisibility::Reveal {
            let exists = self
                .organizations
                .exists(org_id)
                .await
                .map_err(|e| GateError::internal(format!("Failed to load organization: {e}")))?;
            if !exists {
                return Err(GateError::not_found("Organization not found"));
            }
        }

        Err(GateError::authorization(AuthorizationReason::NotAMember))
    }
}
