//! Organizations, memberships and role checks.
//!
//! Every organization-scoped request resolves the caller's [`Membership`]
//! through the [`MembershipResolver`] and, when the route restricts roles,
//! passes it through the [`RoleGate`].
//!
//! # Example
//!
//! ```rust
//! use ledgergate::organizations::{InMemoryOrgStore, MembershipResolver, OrgRole, Organization};
//! use std::sync::Arc;
//!
//! let store = InMemoryOrgStore::new();
//! let org = Organization::new("Acme Books");
//! store.insert_org(org.clone());
//! store.add_member(org.id, "user-1", OrgRole::Owner);
//!
//! let resolver = MembershipResolver::new(Arc::new(store.clone()), Arc::new(store));
//! ```

mod gate;
mod memory;
mod resolver;
pub mod storage;
mod types;

pub use gate::RoleGate;
pub use memory::InMemoryOrgStore;
pub use resolver::{MembershipResolver, OrgVisibility};
pub use storage::{MembershipStore, OrganizationStore};
pub use types::{Membership, OrgRole, Organization, ParseRoleError, RoleSet};
