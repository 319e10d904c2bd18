//! Read-only repository lookup.

use tracing::{debug, instrument};

use ncloud_common::{
    CanonicalRecord, NcloudError, NcloudResult, Normalizer, ProviderContext, ReadGateway,
};

use crate::normalize::RepositoryNormalizer;
use crate::resource::RESOURCE_NAME;
use crate::types::RepositoryDetail;

/// Looks up a repository by name.
///
/// Unlike the resource read, an absent repository is an error here.
pub struct RepositoryDataSource<G> {
    gateway: G,
}

impl<G> RepositoryDataSource<G>
where
    G: ReadGateway<Raw = RepositoryDetail>,
{
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    #[instrument(skip(self, ctx))]
    pub async fn read(&self, ctx: &ProviderContext, name: &str) -> NcloudResult<CanonicalRecord> {
        match self.gateway.get_by_name(ctx, name).await? {
            Some(raw) => {
                debug!(id = raw.id, "Repository found");
                RepositoryNormalizer.normalize(&raw)
            }
            None => Err(NcloudError::not_found(RESOURCE_NAME, name)),
        }
    }
}
