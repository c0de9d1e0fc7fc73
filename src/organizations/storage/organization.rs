//! Organization storage trait.

use crate::error::Result;
use crate::organizations::Organization;
use async_trait::async_trait;
use uuid::Uuid;

/// Read access to organizations.
#[async_trait]
pub trait OrganizationStore: Send + Sync + 'static {
    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>>;

    async fn exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.find_organization(id).await?.is_some())
    }
}
