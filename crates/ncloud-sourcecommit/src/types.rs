//! SourceCommit repository wire types and request payloads.

use serde::{Deserialize, Serialize};

use ncloud_common::{NcloudError, NcloudResult, RemoteObject, ResourceSpec};

/// Longest accepted repository name.
pub const MAX_NAME_LEN: usize = 100;

/// Repository creator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryCreated {
    #[serde(default)]
    pub user: Option<String>,
}

/// Clone endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryGit {
    #[serde(default)]
    pub https: Option<String>,
    #[serde(default)]
    pub ssh: Option<String>,
}

/// Linked services.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryLinked {
    #[serde(rename = "FileSafer", default)]
    pub file_safer: Option<bool>,
}

/// Repository detail as returned by the SourceCommit API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryDetail {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created: RepositoryCreated,
    #[serde(default)]
    pub git: RepositoryGit,
    #[serde(default)]
    pub linked: RepositoryLinked,
}

impl RemoteObject for RepositoryDetail {
    fn remote_id(&self) -> String {
        self.id.to_string()
    }

    fn remote_name(&self) -> String {
        self.name.clone()
    }
}

/// Desired state of a new repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub filesafer: Option<bool>,
}

impl RepositorySpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_filesafer(mut self, enabled: bool) -> Self {
        self.filesafer = Some(enabled);
        self
    }

    /// Checks the name length (1 to 100 characters).
    pub fn validate(&self) -> NcloudResult<()> {
        let len = self.name.chars().count();
        if len == 0 || len > MAX_NAME_LEN {
            return Err(NcloudError::invalid_config(
                "name",
                format!(
                    "expected length between 1 and {}, got {}",
                    MAX_NAME_LEN, len
                ),
            ));
        }
        Ok(())
    }
}

impl ResourceSpec for RepositorySpec {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Mutable repository fields. The name cannot change in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryChanges {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub filesafer: Option<bool>,
}
