//! Membership storage trait.

use crate::error::Result;
use crate::organizations::Membership;
use async_trait::async_trait;
use uuid::Uuid;

/// Read access to memberships.
///
/// The request pipeline never writes; adding, removing and re-roling
/// members happens elsewhere. Implementations must guarantee at most one
/// membership per `(org_id, user_id)` pair.
///
/// # Example
///
/// ```rust,ignore
/// use ledgergate::organizations::{Membership, MembershipStore};
/// use async_trait::async_trait;
///
/// struct PgMemberships { pool: PgPool }
///
/// #[async_trait]
/// impl MembershipStore for PgMemberships {
///     async fn find_membership(&self, org_id: Uuid, user_id: &str) -> Result<Option<Membership>> {
///         Ok(sqlx::query_as("SELECT ... WHERE organization_id = $1 AND user_id = $2")
///             .bind(org_id)
///             .bind(user_id)
///             .fetch_optional(&self.pool)
///             .await
///             .map_err(anyhow::Error::from)?)
///     }
///
///     // ...
/// }
/// ```
#[async_trait]
pub trait MembershipStore: Send + Sync + 'static {
    /// The caller's membership in `org_id`, if any.
    async fn find_membership(&self, org_id: Uuid, user_id: &str) -> Result<Option<Membership>>;

    /// Every membership of an organization.
    async fn list_members(&self, org_id: Uuid) -> Result<Vec<Membership>>;

    async fn is_member(&self, org_id: Uuid, user_id: &str) -> Result<bool> {
        Ok(self.find_membership(org_id, user_id).await?.is_some())
    }
}
