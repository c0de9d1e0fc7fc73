//! Storage traits for organizations.
//!
//! Implement these for your database layer; [`InMemoryOrgStore`](super::InMemoryOrgStore)
//! implements both for tests and local development.

mod membership;
mod organization;

pub use membership::MembershipStore;
pub use organization::OrganizationStore;
