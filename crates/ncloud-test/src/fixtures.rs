//! Test fixtures for common provider scenarios
//!
//! Provides ready-made sessions and raw backend records

use ncloud_common::{BackendFlavor, ProviderConfig, ProviderContext};

/// Session fixtures
pub mod context_fixtures {
    use super::*;

    /// Default configuration for the given flavor
    pub fn config(flavor: BackendFlavor) -> ProviderConfig {
        ProviderConfig {
            support_vpc: flavor == BackendFlavor::Vpc,
            ..ProviderConfig::default()
        }
    }

    /// Session on the given flavor with default timeouts
    pub fn context(flavor: BackendFlavor) -> ProviderContext {
        ProviderContext::new(config(flavor)).expect("default config is valid")
    }

    /// VPC session
    pub fn vpc() -> ProviderContext {
        context(BackendFlavor::Vpc)
    }

    /// Classic session
    pub fn classic() -> ProviderContext {
        context(BackendFlavor::Classic)
    }
}

/// SourceCommit repository fixtures
pub mod repository_fixtures {
    use ncloud_sourcecommit::types::{
        RepositoryCreated, RepositoryDetail, RepositoryGit, RepositoryLinked,
    };
    use ncloud_sourcecommit::RepositorySpec;

    /// Fully populated repository detail
    pub fn repository(id: i64, name: &str) -> RepositoryDetail {
        RepositoryDetail {
            id,
            name: name.to_string(),
            description: Some(format!("{} description", name)),
            created: RepositoryCreated {
                user: Some("tester@example.com".to_string()),
            },
            git: RepositoryGit {
                https: Some(format!("https://devtools.example.com/{}.git", name)),
                ssh: Some(format!("ssh://devtools.example.com/{}.git", name)),
            },
            linked: RepositoryLinked {
                file_safer: Some(false),
            },
        }
    }

    /// Create request for a repository with a description
    pub fn spec(name: &str) -> RepositorySpec {
        RepositorySpec::new(name).with_description(format!("{} description", name))
    }
}

/// Public IP fixtures
pub mod public_ip_fixtures {
    use ncloud_publicip::{
        AssociatedServer, ClassicPublicIpInstance, CommonCode, VpcPublicIpInstance, Zone,
    };

    /// Classic public IP, attached to `server` (instance no, name) if given
    pub fn classic(
        no: &str,
        ip: &str,
        zone: &str,
        server: Option<(&str, &str)>,
    ) -> ClassicPublicIpInstance {
        ClassicPublicIpInstance {
            public_ip_instance_no: no.to_string(),
            public_ip: ip.to_string(),
            public_ip_description: Some(String::new()),
            public_ip_instance_status: Some(CommonCode::new(if server.is_some() {
                "USED"
            } else {
                "CREAT"
            })),
            public_ip_kind_type: Some(CommonCode::new("GEN")),
            zone: Some(Zone {
                zone_code: Some(zone.to_string()),
                ..Zone::default()
            }),
            server_instance_associated_with_public_ip: server.map(|(server_no, server_name)| {
                AssociatedServer {
                    server_instance_no: Some(server_no.to_string()),
                    server_name: Some(server_name.to_string()),
                }
            }),
        }
    }

    /// VPC public IP, attached to `server` (instance no, name) if given
    pub fn vpc(no: &str, ip: &str, server: Option<(&str, &str)>) -> VpcPublicIpInstance {
        VpcPublicIpInstance {
            public_ip_instance_no: no.to_string(),
            public_ip: ip.to_string(),
            public_ip_description: Some(String::new()),
            public_ip_instance_status: Some(CommonCode::new("RUN")),
            server_instance_no: server.map(|(server_no, _)| server_no.to_string()),
            server_name: server.map(|(_, server_name)| server_name.to_string()),
        }
    }
}
