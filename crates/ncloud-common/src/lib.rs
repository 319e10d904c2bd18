//! Shared reconciliation engine for NCloud resources.
//!
//! This crate holds everything a resource implementation needs apart from
//! its wire types:
//!
//! - [`record`]: canonical, backend-neutral records
//! - [`gateway`]: remote API and normalizer traits
//! - [`filter`]: client-side record filtering
//! - [`resolve`]: exactly-one result resolution
//! - [`wait`]: the polling state machine
//! - [`controller`]: create/read/update/delete/list orchestration
//! - [`config`] and [`context`]: provider configuration and session state
//! - [`error`]: error types
//!
//! # Architecture
//!
//! A resource pairs a [`Gateway`] (remote calls, supplied by the caller)
//! with a [`Normalizer`] per backend flavor and hands both to a
//! [`LifecycleController`]:
//!
//! 1. Mutations are submitted through the gateway
//! 2. The controller polls until the remote side converges
//! 3. Raw records are normalized into [`CanonicalRecord`]s
//! 4. Lists are filtered and, for singular reads, resolved to one record
//!
//! # Example
//!
//! ```ignore
//! use ncloud_common::{LifecycleController, ProviderConfig, ProviderContext, ResourceIdentity};
//!
//! async fn refresh(ctx: &ProviderContext, id: &str) -> NcloudResult<()> {
//!     let controller = LifecycleController::new("repository", gateway, RepositoryNormalizer);
//!     let mut identity = ResourceIdentity::from_id(id);
//!     if controller.read(ctx, &mut identity).await?.is_none() {
//!         // resource vanished
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod record;
pub mod resolve;
pub mod wait;

// Re-export commonly used items at crate root
pub use config::{ProviderConfig, RegionConfig, TimeoutConfig, WaitConfig};
pub use context::{BackendFlavor, ProviderContext};
pub use controller::{LifecycleController, Reconciled, ResourceIdentity};
pub use error::{NcloudError, NcloudResult};
pub use filter::{FilterPredicate, FilterSet};
pub use gateway::{
    flatten_common_code, set_string_if_not_empty, CodedValue, Gateway, Normalizer, ReadGateway,
    RemoteObject, ResourceSpec,
};
pub use record::{CanonicalRecord, FieldKind, FieldSpec, RecordSchema, Value};
pub use resolve::resolve_one;
pub use wait::{PollState, Refreshed, StateChangeConf, UnexpectedStatePolicy};
