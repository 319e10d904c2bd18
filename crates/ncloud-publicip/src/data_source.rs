//! Public IP data source over both backend flavors.

use tracing::{debug, instrument};

use ncloud_common::{
    BackendFlavor, CanonicalRecord, FilterSet, LifecycleController, NcloudResult,
    ProviderContext, ReadGateway,
};

use crate::normalize::{ClassicPublicIpNormalizer, VpcPublicIpNormalizer};
use crate::types::{ClassicPublicIpInstance, PublicIpQuery, VpcPublicIpInstance};

pub const DATA_SOURCE_NAME: &str = "public_ip";

/// Lists public IPs from whichever backend the session selects.
///
/// The backend is chosen by [`ProviderContext::flavor`] on every call, so
/// one data source serves both Classic and VPC sessions.
pub struct PublicIpDataSource<C, V> {
    classic: LifecycleController<C, ClassicPublicIpNormalizer>,
    vpc: LifecycleController<V, VpcPublicIpNormalizer>,
}

impl<C, V> PublicIpDataSource<C, V>
where
    C: ReadGateway<Raw = ClassicPublicIpInstance, Query = PublicIpQuery>,
    V: ReadGateway<Raw = VpcPublicIpInstance, Query = PublicIpQuery>,
{
    pub fn new(classic: C, vpc: V) -> Self {
        Self {
            classic: LifecycleController::new(
                DATA_SOURCE_NAME,
                classic,
                ClassicPublicIpNormalizer,
            ),
            vpc: LifecycleController::new(DATA_SOURCE_NAME, vpc, VpcPublicIpNormalizer),
        }
    }

    pub fn classic_gateway(&self) -> &C {
        self.classic.gateway()
    }

    pub fn vpc_gateway(&self) -> &V {
        self.vpc.gateway()
    }

    /// Lists, normalizes and filters public IPs.
    #[instrument(skip(self, ctx, filters), fields(flavor = %ctx.flavor()))]
    pub async fn list(
        &self,
        ctx: &ProviderContext,
        query: &PublicIpQuery,
        filters: &FilterSet,
    ) -> NcloudResult<Vec<CanonicalRecord>> {
        let records = match ctx.flavor() {
            BackendFlavor::Classic => self.classic.list(ctx, query, filters).await?,
            BackendFlavor::Vpc => self.vpc.list(ctx, query, filters).await?,
        };
        debug!(count = records.len(), "Public IPs after filtering");
        Ok(records)
    }

    /// Like [`list`](Self::list), but requires exactly one match.
    #[instrument(skip(self, ctx, filters), fields(flavor = %ctx.flavor()))]
    pub async fn read(
        &self,
        ctx: &ProviderContext,
        query: &PublicIpQuery,
        filters: &FilterSet,
    ) -> NcloudResult<CanonicalRecord> {
        match ctx.flavor() {
            BackendFlavor::Classic => self.classic.read_singular(ctx, query, filters).await,
            BackendFlavor::Vpc => self.vpc.read_singular(ctx, query, filters).await,
        }
    }
}
