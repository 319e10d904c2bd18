//! Managed SourceCommit repository.

use tracing::{info, instrument};

use ncloud_common::{
    CanonicalRecord, Gateway, LifecycleController, NcloudResult, ProviderContext, Reconciled,
    ResourceIdentity,
};

use crate::normalize::RepositoryNormalizer;
use crate::types::{RepositoryChanges, RepositoryDetail, RepositorySpec};

pub const RESOURCE_NAME: &str = "sourcecommit_repository";

/// Repository resource over any gateway speaking the SourceCommit API.
///
/// The name is the lookup key of every remote call; a rename is a
/// delete followed by a create and is left to the caller.
pub struct RepositoryResource<G> {
    controller: LifecycleController<G, RepositoryNormalizer>,
}

impl<G> RepositoryResource<G>
where
    G: Gateway<Raw = RepositoryDetail, Spec = RepositorySpec, Changes = RepositoryChanges>,
{
    pub fn new(gateway: G) -> Self {
        Self {
            controller: LifecycleController::new(RESOURCE_NAME, gateway, RepositoryNormalizer),
        }
    }

    pub fn controller(&self) -> &LifecycleController<G, RepositoryNormalizer> {
        &self.controller
    }

    pub fn gateway(&self) -> &G {
        self.controller.gateway()
    }

    /// Validates `spec`, creates the repository and waits until it is
    /// visible by name.
    pub async fn create(
        &self,
        ctx: &ProviderContext,
        spec: &RepositorySpec,
    ) -> NcloudResult<Reconciled> {
        spec.validate()?;
        self.controller.create(ctx, spec).await
    }

    pub async fn read(
        &self,
        ctx: &ProviderContext,
        identity: &mut ResourceIdentity,
    ) -> NcloudResult<Option<CanonicalRecord>> {
        self.controller.read(ctx, identity).await
    }

    pub async fn update(
        &self,
        ctx: &ProviderContext,
        identity: &mut ResourceIdentity,
        changes: &RepositoryChanges,
    ) -> NcloudResult<Option<CanonicalRecord>> {
        self.controller.update(ctx, identity, changes).await
    }

    pub async fn delete(
        &self,
        ctx: &ProviderContext,
        identity: &mut ResourceIdentity,
    ) -> NcloudResult<()> {
        self.controller.delete(ctx, identity).await
    }

    /// Adopts an existing repository by id.
    ///
    /// The id is taken as-is and then read through the id cross-reference;
    /// an id that does not exist yields `Ok(None)`.
    #[instrument(skip(self, ctx))]
    pub async fn import(
        &self,
        ctx: &ProviderContext,
        id: &str,
    ) -> NcloudResult<Option<(ResourceIdentity, CanonicalRecord)>> {
        let mut identity = ResourceIdentity::from_id(id);
        let record = self.controller.read(ctx, &mut identity).await?;

        Ok(record.map(|record| {
            info!("Imported {} {}", RESOURCE_NAME, identity);
            (identity, record)
        }))
    }
}
