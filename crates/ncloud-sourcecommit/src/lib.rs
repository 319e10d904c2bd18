//! SourceCommit repository resource and data source.
//!
//! - [`types`]: API wire types and request payloads
//! - [`normalize`]: [`REPOSITORY_SCHEMA`] and its normalizer
//! - [`resource`]: create/read/update/delete/import
//! - [`data_source`]: lookup by name
//!
//! The SourceCommit API has no direct lookup by id. Id-only reads (after
//! an import, or during the deletion wait) list every repository and
//! re-query by the matching name, which the default
//! [`ReadGateway::get_by_id`](ncloud_common::ReadGateway::get_by_id) does.

pub mod data_source;
pub mod normalize;
pub mod resource;
pub mod types;

pub use data_source::RepositoryDataSource;
pub use normalize::{RepositoryNormalizer, REPOSITORY_SCHEMA};
pub use resource::{RepositoryResource, RESOURCE_NAME};
pub use types::{RepositoryChanges, RepositoryDetail, RepositorySpec, MAX_NAME_LEN};
