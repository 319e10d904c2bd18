//! Canonical form of a SourceCommit repository.

use ncloud_common::{
    BackendFlavor, CanonicalRecord, FieldSpec, NcloudResult, Normalizer, RecordSchema,
};

use crate::types::RepositoryDetail;

pub static REPOSITORY_SCHEMA: RecordSchema = RecordSchema {
    name: "sourcecommit_repository",
    fields: &[
        FieldSpec::string("id"),
        FieldSpec::string("name"),
        FieldSpec::string("description"),
        FieldSpec::string("creator"),
        FieldSpec::string("git_https"),
        FieldSpec::string("git_ssh"),
        FieldSpec::bool("filesafer"),
    ],
};

/// SourceCommit exposes a single API shape, served on both platforms.
#[derive(Debug, Clone, Copy, Default)]
pub struct RepositoryNormalizer;

impl Normalizer for RepositoryNormalizer {
    type Raw = RepositoryDetail;

    fn flavor(&self) -> BackendFlavor {
        BackendFlavor::Vpc
    }

    fn schema(&self) -> &'static RecordSchema {
        &REPOSITORY_SCHEMA
    }

    fn normalize(&self, raw: &RepositoryDetail) -> NcloudResult<CanonicalRecord> {
        CanonicalRecord::new(&REPOSITORY_SCHEMA)
            .with("id", raw.id.to_string())?
            .with("name", raw.name.as_str())?
            .with("description", raw.description.as_deref())?
            .with("creator", raw.created.user.as_deref())?
            .with("git_https", raw.git.https.as_deref())?
            .with("git_ssh", raw.git.ssh.as_deref())?
            .with("filesafer", raw.linked.file_safer)
    }
}
