//! Remote gateway and normalizer abstractions.
//!
//! The gateway performs the actual remote calls and is supplied by the
//! caller; this crate only drives it. Backends differ in wire shape, so
//! every backend flavor pairs its gateway with a [`Normalizer`] that maps
//! its raw records onto a shared [`RecordSchema`].

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::context::{BackendFlavor, ProviderContext};
use crate::error::NcloudResult;
use crate::record::{CanonicalRecord, RecordSchema};

/// Identity accessors every raw backend record provides.
pub trait RemoteObject {
    /// Remote-assigned identifier in string form.
    fn remote_id(&self) -> String;

    /// Human-assigned unique name (or the backend's natural lookup key).
    fn remote_name(&self) -> String;
}

/// Desired state of a resource to be created.
pub trait ResourceSpec {
    /// Name the resource will be created under.
    fn name(&self) -> &str;
}

/// Read side of a remote API.
#[async_trait]
pub trait ReadGateway: Send + Sync {
    /// Raw record as returned by this backend.
    type Raw: RemoteObject + Send + Sync;

    /// Server-side list parameters.
    type Query: Default + Send + Sync;

    /// Lists records matching the server-side query.
    async fn list(&self, ctx: &ProviderContext, query: &Self::Query)
        -> NcloudResult<Vec<Self::Raw>>;

    /// Fetches a record by name; `Ok(None)` if it does not exist.
    async fn get_by_name(&self, ctx: &ProviderContext, name: &str)
        -> NcloudResult<Option<Self::Raw>>;

    /// Fetches a record by id; `Ok(None)` if it does not exist.
    ///
    /// The default lists every record, cross-references the id to a name
    /// and queries by that name. Backends with direct id lookup override
    /// it.
    async fn get_by_id(&self, ctx: &ProviderContext, id: &str) -> NcloudResult<Option<Self::Raw>> {
        debug!(id, "Resolving id through list");
        let records = self.list(ctx, &<Self::Query as Default>::default()).await?;

        match records.iter().find(|r| r.remote_id() == id) {
            Some(record) => {
                let name = record.remote_name();
                self.get_by_name(ctx, &name).await
            }
            None => {
                warn!(id, "No such id in list");
                Ok(None)
            }
        }
    }
}

/// Mutating side of a remote API.
#[async_trait]
pub trait Gateway: ReadGateway {
    /// Create request payload.
    type Spec: ResourceSpec + std::fmt::Debug + Send + Sync;

    /// Update request payload (mutable fields only).
    type Changes: std::fmt::Debug + Send + Sync;

    /// Requests creation; returns the remote-assigned id.
    async fn create(&self, ctx: &ProviderContext, spec: &Self::Spec) -> NcloudResult<String>;

    /// Applies changes to the named resource.
    async fn update(
        &self,
        ctx: &ProviderContext,
        name: &str,
        changes: &Self::Changes,
    ) -> NcloudResult<()>;

    /// Requests deletion of the named resource.
    async fn delete(&self, ctx: &ProviderContext, name: &str) -> NcloudResult<()>;
}

/// Maps the raw records of one backend flavor onto a canonical schema.
///
/// Implementations are pure: the same raw record always yields the same
/// canonical record.
pub trait Normalizer: Send + Sync {
    /// Raw record type of the backend.
    type Raw;

    /// Backend flavor this normalizer handles.
    fn flavor(&self) -> BackendFlavor;

    /// Canonical schema every produced record conforms to.
    fn schema(&self) -> &'static RecordSchema;

    /// Converts one raw record.
    fn normalize(&self, raw: &Self::Raw) -> NcloudResult<CanonicalRecord>;
}

/// A coded sub-object (status, kind, ...).
pub trait CodedValue {
    /// The code, if any.
    fn code(&self) -> Option<&str>;
}

/// Returns the code of a coded sub-object, or `None` if the sub-object or
/// its code is absent or empty.
pub fn flatten_common_code<C: CodedValue + ?Sized>(value: Option<&C>) -> Option<&str> {
    value.and_then(CodedValue::code).filter(|c| !c.is_empty())
}

/// Assigns `field` only when `value` is present and non-empty; otherwise
/// the field keeps its current value.
pub fn set_string_if_not_empty(
    record: &mut CanonicalRecord,
    field: &str,
    value: Option<&str>,
) -> NcloudResult<()> {
    match value {
        Some(v) if !v.is_empty() => record.set(field, v),
        _ => Ok(()),
    }
}
