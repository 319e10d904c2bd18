//! Public IP data source.
//!
//! The Classic API nests status, kind, zone and the associated server in
//! sub-objects; the VPC API returns the server fields flat and has no kind
//! or zone. Both normalize to [`PUBLIC_IP_SCHEMA`], and
//! [`PublicIpDataSource`] picks the backend from the session.

pub mod data_source;
pub mod normalize;
pub mod types;

pub use data_source::{PublicIpDataSource, DATA_SOURCE_NAME};
pub use normalize::{ClassicPublicIpNormalizer, VpcPublicIpNormalizer, PUBLIC_IP_SCHEMA};
pub use types::{
    AssociatedServer, ClassicPublicIpInstance, CommonCode, PublicIpQuery, VpcPublicIpInstance,
    Zone,
};
