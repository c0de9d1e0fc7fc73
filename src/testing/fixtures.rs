//! Test fixtures: fake data and a seeded organization.

use crate::auth::Identity;
use crate::organizations::{InMemoryOrgStore, OrgRole, Organization};
use uuid::Uuid;

/// Helper functions for generating fake test data
pub mod fake {
    use uuid::Uuid;

    pub fn email() -> String {
        format!("test-{}@example.com", Uuid::new_v4().simple())
    }

    /// A user id as issuers put it in `sub`
    pub fn user_id() -> String {
        format!("user_{}", &Uuid::new_v4().simple().to_string()[..12])
    }

    pub fn org_name() -> String {
        format!("Test Books {}", &Uuid::new_v4().simple().to_string()[..6])
    }

    pub fn account_name() -> String {
        const KINDS: &[&str] = &["Checking", "Savings", "Petty Cash", "Payroll", "Reserve"];
        format!("{} {}", KINDS[fastrand::usize(..KINDS.len())], fastrand::u16(100..1000))
    }

    /// A positive amount with two decimals
    pub fn amount() -> f64 {
        f64::from(fastrand::u32(1..1_000_000)) / 100.0
    }

    pub fn currency() -> &'static str {
        const CODES: &[&str] = &["USD", "EUR", "GBP", "CAD", "JPY"];
        CODES[fastrand::usize(..CODES.len())]
    }

    /// Generate a random string of the given length
    pub fn string(length: usize) -> String {
        (0..length).map(|_| fastrand::alphabetic()).collect()
    }
}

/// A generated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestUser {
    pub id: String,
    pub email: String,
}

impl TestUser {
    pub fn generate() -> Self {
        Self {
            id: fake::user_id(),
            email: fake::email(),
        }
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: fake::email(),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::new(&self.id, &self.email)
    }
}

/// One organization with a member of each role, plus an outsider with no
/// membership anywhere.
#[derive(Clone)]
pub struct OrgFixture {
    pub store: InMemoryOrgStore,
    pub org: Organization,
    pub owner: TestUser,
    pub admin: TestUser,
    pub member: TestUser,
    pub outsider: TestUser,
}

impl OrgFixture {
    /// Seeds a fresh store.
    pub fn seeded() -> Self {
        Self::seed_into(InMemoryOrgStore::new())
    }

    /// Adds another organization with its own members to an existing store.
    pub fn seed_into(store: InMemoryOrgStore) -> Self {
        let org = Organization::new(fake::org_name());
        store.insert_org(org.clone());

        let owner = TestUser::generate();
        let admin = TestUser::generate();
        let member = TestUser::generate();
        store.add_member(org.id, &owner.id, OrgRole::Owner);
        store.add_member(org.id, &admin.id, OrgRole::Admin);
        store.add_member(org.id, &member.id, OrgRole::Member);

        Self {
            store,
            org,
            owner,
            admin,
            member,
            outsider: TestUser::generate(),
        }
    }

    pub fn user(&self, role: OrgRole) -> &TestUser {
        match role {
            OrgRole::Owner => &self.owner,
            OrgRole::Admin => &self.admin,
            OrgRole::Member => &self.member,
        }
    }

    /// An id no organization has.
    pub fn missing_org_id() -> Uuid {
        Uuid::new_v4()
    }

    /// `/organizations/{id}` followed by `rest`.
    pub fn path(&self, rest: &str) -> String {
        format!("/organizations/{}{rest}", self.org.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::organizations::MembershipStore;

    #[test]
    fn test_fake_values() {
        assert!(fake::email().contains('@'));
        assert_eq!(fake::currency().len(), 3);
        assert!(fake::amount() > 0.0);
        assert_eq!(fake::string(12).len(), 12);
        assert_ne!(fake::user_id(), fake::user_id());
    }

    #[tokio::test]
    async fn test_fixture_seeds_one_member_per_role() {
        let fixture = OrgFixture::seeded();
        let members = fixture.store.list_members(fixture.org.id).await.unwrap();
        let roles: Vec<OrgRole> = members.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![OrgRole::Owner, OrgRole::Admin, OrgRole::Member]);

        let outsider = fixture
            .store
            .find_membership(fixture.org.id, &fixture.outsider.id)
            .await
            .unwrap();
        assert!(outsider.is_none());
    }

    #[tokio::test]
    async fn test_seed_into_shares_the_store() {
        let first = OrgFixture::seeded();
        let second = OrgFixture::seed_into(first.store.clone());
        assert_ne!(first.org.id, second.org.id);
        assert!(
            second
                .store
                .find_membership(first.org.id, &first.owner.id)
                .await
                .unwrap()
                .is_some()
        );
    }
}
