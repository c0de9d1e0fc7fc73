//! In-memory organization and membership store.
//!
//! Used by the test fixtures and for running the API locally without a
//! database.

use super::storage::{MembershipStore, OrganizationStore};
use super::types::{Membership, OrgRole, Organization};
use crate::error::{GateError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    orgs: RwLock<HashMap<Uuid, Organization>>,
    memberships: RwLock<HashMap<(Uuid, String), Membership>>,
    unavailable: AtomicBool,
}

/// In-memory store implementing both organization storage traits.
///
/// Cloning shares the same underlying data.
#[derive(Clone, Default)]
pub struct InMemoryOrgStore {
    inner: Arc<Inner>,
}

impl InMemoryOrgStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_org(&self, org: Organization) {
        self.inner
            .orgs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(org.id, org);
    }

    /// Inserts or replaces the membership for its `(organization, user)` pair.
    pub fn insert_membership(&self, membership: Membership) {
        let key = (membership.organization_id, membership.user_id.clone());
        self.inner
            .memberships
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, membership);
    }

    pub fn add_member(&self, org_id: Uuid, user_id: impl Into<String>, role: OrgRole) {
        self.insert_membership(Membership::new(org_id, user_id, role));
    }

    pub fn remove_membership(&self, org_id: Uuid, user_id: &str) {
        self.inner
            .memberships
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(org_id, user_id.to_string()));
    }

    /// Makes every lookup fail, to exercise outage handling.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            Err(GateError::internal("organization store unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl OrganizationStore for InMemoryOrgStore {
    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>> {
        self.check_available()?;
        Ok(self
            .inner
            .orgs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned())
    }
}

#[async_trait]
impl MembershipStore for InMemoryOrgStore {
    async fn find_membership(&self, org_id: Uuid, user_id: &str) -> Result<Option<Membership>> {
        self.check_available()?;
        Ok(self
            .inner
            .memberships
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(org_id, user_id.to_string()))
            .cloned())
    }

    async fn list_members(&self, org_id: Uuid) -> Result<Vec<Membership>> {
        self.check_available()?;
        let mut members: Vec<Membership> = self
            .inner
            .memberships
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|m| m.organization_id == org_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| {
            b.role
                .hierarchy_level()
                .cmp(&a.role.hierarchy_level())
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        Ok(members)
    }
}
