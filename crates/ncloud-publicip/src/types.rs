//! Public IP wire types of both backends and the list query.

use serde::{Deserialize, Serialize};

use ncloud_common::{CodedValue, RemoteObject};

/// Code/name pair the Classic API uses for enumerated values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonCode {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub code_name: Option<String>,
}

impl CommonCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            code_name: None,
        }
    }
}

impl CodedValue for CommonCode {
    fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

/// Classic zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    #[serde(default)]
    pub zone_no: Option<String>,
    #[serde(default)]
    pub zone_code: Option<String>,
    #[serde(default)]
    pub zone_name: Option<String>,
}

impl CodedValue for Zone {
    fn code(&self) -> Option<&str> {
        self.zone_code.as_deref()
    }
}

/// Server a Classic public IP is attached to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociatedServer {
    #[serde(default)]
    pub server_instance_no: Option<String>,
    #[serde(default)]
    pub server_name: Option<String>,
}

/// Classic (legacy flat) public IP instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassicPublicIpInstance {
    pub public_ip_instance_no: String,
    pub public_ip: String,
    #[serde(default)]
    pub public_ip_description: Option<String>,
    #[serde(default)]
    pub public_ip_instance_status: Option<CommonCode>,
    #[serde(default)]
    pub public_ip_kind_type: Option<CommonCode>,
    #[serde(default)]
    pub zone: Option<Zone>,
    #[serde(default)]
    pub server_instance_associated_with_public_ip: Option<AssociatedServer>,
}

impl ClassicPublicIpInstance {
    /// Instance number of the attached server, if any.
    pub fn server_instance_no(&self) -> Option<&str> {
        self.server_instance_associated_with_public_ip
            .as_ref()
            .and_then(|s| s.server_instance_no.as_deref())
            .filter(|no| !no.is_empty())
    }
}

impl RemoteObject for ClassicPublicIpInstance {
    fn remote_id(&self) -> String {
        self.public_ip_instance_no.clone()
    }

    fn remote_name(&self) -> String {
        self.public_ip.clone()
    }
}

/// VPC (network-scoped) public IP instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpcPublicIpInstance {
    pub public_ip_instance_no: String,
    pub public_ip: String,
    #[serde(default)]
    pub public_ip_description: Option<String>,
    #[serde(default)]
    pub public_ip_instance_status: Option<CommonCode>,
    #[serde(default)]
    pub server_instance_no: Option<String>,
    #[serde(default)]
    pub server_name: Option<String>,
}

impl VpcPublicIpInstance {
    /// Instance number of the attached server, if any.
    pub fn server_instance_no(&self) -> Option<&str> {
        self.server_instance_no.as_deref().filter(|no| !no.is_empty())
    }
}

impl RemoteObject for VpcPublicIpInstance {
    fn remote_id(&self) -> String {
        self.public_ip_instance_no.clone()
    }

    fn remote_name(&self) -> String {
        self.public_ip.clone()
    }
}

/// Server-side list parameters.
///
/// `zone` is only understood by the Classic API; the VPC backend ignores
/// it, and callers filter on the canonical `zone` field instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicIpQuery {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub is_associated: Option<bool>,
    #[serde(default)]
    pub zone: Option<String>,
}

impl PublicIpQuery {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn associated(mut self, associated: bool) -> Self {
        self.is_associated = Some(associated);
        self
    }

    pub fn in_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    /// Returns true if `id` and `server_instance_no` satisfy the id and
    /// association parameters. Zone matching is left to the backend.
    pub fn admits(&self, id: &str, server_instance_no: Option<&str>) -> bool {
        let id_ok = self.id.as_deref().map_or(true, |want| want == id);
        let assoc_ok = self
            .is_associated
            .map_or(true, |want| want == server_instance_no.is_some());
        id_ok && assoc_ok
    }
}
