//! Canonical public IP records.
//!
//! Both backends produce [`PUBLIC_IP_SCHEMA`] records. Fields a backend
//! does not know (the VPC API has no kind type or zone, for instance) stay
//! null, so the field-name set never depends on the backend.

use ncloud_common::{
    flatten_common_code, set_string_if_not_empty, BackendFlavor, CanonicalRecord, FieldSpec,
    NcloudResult, Normalizer, RecordSchema,
};

use crate::types::{ClassicPublicIpInstance, VpcPublicIpInstance};

pub static PUBLIC_IP_SCHEMA: RecordSchema = RecordSchema {
    name: "public_ip",
    fields: &[
        FieldSpec::string("id"),
        FieldSpec::string("instance_no"),
        FieldSpec::string("public_ip_no"),
        FieldSpec::string("public_ip"),
        FieldSpec::string("description"),
        FieldSpec::string("status"),
        FieldSpec::string("kind_type"),
        FieldSpec::string("zone"),
        FieldSpec::string("server_instance_no"),
        FieldSpec::string("server_name"),
        FieldSpec::bool("is_associated"),
    ],
};

#[derive(Debug, Clone, Copy, Default)]
pub struct ClassicPublicIpNormalizer;

impl Normalizer for ClassicPublicIpNormalizer {
    type Raw = ClassicPublicIpInstance;

    fn flavor(&self) -> BackendFlavor {
        BackendFlavor::Classic
    }

    fn schema(&self) -> &'static RecordSchema {
        &PUBLIC_IP_SCHEMA
    }

    fn normalize(&self, raw: &ClassicPublicIpInstance) -> NcloudResult<CanonicalRecord> {
        let mut record = CanonicalRecord::new(&PUBLIC_IP_SCHEMA)
            .with("id", raw.public_ip_instance_no.as_str())?
            .with("instance_no", raw.public_ip_instance_no.as_str())?
            .with("public_ip_no", raw.public_ip_instance_no.as_str())?
            .with("public_ip", raw.public_ip.as_str())?
            .with("description", raw.public_ip_description.as_deref())?
            .with("is_associated", raw.server_instance_no().is_some())?;

        set_string_if_not_empty(
            &mut record,
            "status",
            flatten_common_code(raw.public_ip_instance_status.as_ref()),
        )?;
        set_string_if_not_empty(
            &mut record,
            "kind_type",
            flatten_common_code(raw.public_ip_kind_type.as_ref()),
        )?;
        set_string_if_not_empty(&mut record, "zone", flatten_common_code(raw.zone.as_ref()))?;

        if let Some(server) = &raw.server_instance_associated_with_public_ip {
            set_string_if_not_empty(
                &mut record,
                "server_instance_no",
                server.server_instance_no.as_deref(),
            )?;
            set_string_if_not_empty(&mut record, "server_name", server.server_name.as_deref())?;
        }

        Ok(record)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VpcPublicIpNormalizer;

impl Normalizer for VpcPublicIpNormalizer {
    type Raw = VpcPublicIpInstance;

    fn flavor(&self) -> BackendFlavor {
        BackendFlavor::Vpc
    }

    fn schema(&self) -> &'static RecordSchema {
        &PUBLIC_IP_SCHEMA
    }

    fn normalize(&self, raw: &VpcPublicIpInstance) -> NcloudResult<CanonicalRecord> {
        let mut record = CanonicalRecord::new(&PUBLIC_IP_SCHEMA)
            .with("id", raw.public_ip_instance_no.as_str())?
            .with("public_ip_no", raw.public_ip_instance_no.as_str())?
            .with("public_ip", raw.public_ip.as_str())?
            .with("description", raw.public_ip_description.as_deref())?
            .with("is_associated", raw.server_instance_no().is_some())?;

        set_string_if_not_empty(&mut record, "server_instance_no", raw.server_instance_no.as_deref())?;
        set_string_if_not_empty(&mut record, "server_name", raw.server_name.as_deref())?;
        set_string_if_not_empty(
            &mut record,
            "status",
            flatten_common_code(raw.public_ip_instance_status.as_ref()),
        )?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AssociatedServer, CommonCode, Zone};
    use ncloud_common::Value;
    use pretty_assertions::assert_eq;

    fn classic() -> ClassicPublicIpInstance {
        ClassicPublicIpInstance {
            public_ip_instance_no: "1001".to_string(),
            public_ip: "203.0.113.10".to_string(),
            public_ip_description: Some("web".to_string()),
            public_ip_instance_status: Some(CommonCode::new("USED")),
            public_ip_kind_type: Some(CommonCode::new("GEN")),
            zone: Some(Zone {
                zone_code: Some("KR-1".to_string()),
                ..Zone::default()
            }),
            server_instance_associated_with_public_ip: Some(AssociatedServer {
                server_instance_no: Some("77".to_string()),
                server_name: Some("web-1".to_string()),
            }),
        }
    }

    fn vpc() -> VpcPublicIpInstance {
        VpcPublicIpInstance {
            public_ip_instance_no: "2001".to_string(),
            public_ip: "198.51.100.7".to_string(),
            public_ip_description: Some(String::new()),
            public_ip_instance_status: Some(CommonCode::new("RUN")),
            server_instance_no: Some(String::new()),
            server_name: None,
        }
    }

    #[test]
    fn test_classic_flattens_nested_parts() {
        let record = ClassicPublicIpNormalizer.normalize(&classic()).unwrap();

        assert_eq!(record.get_str("instance_no"), Some("1001"));
        assert_eq!(record.get_str("status"), Some("USED"));
        assert_eq!(record.get_str("kind_type"), Some("GEN"));
        assert_eq!(record.get_str("zone"), Some("KR-1"));
        assert_eq!(record.get_str("server_name"), Some("web-1"));
        assert_eq!(record.get_bool("is_associated"), Some(true));
    }

    #[test]
    fn test_classic_empty_code_left_null() {
        let mut raw = classic();
        raw.public_ip_kind_type = Some(CommonCode::new(""));
        raw.server_instance_associated_with_public_ip = None;

        let record = ClassicPublicIpNormalizer.normalize(&raw).unwrap();
        assert_eq!(record.get("kind_type"), Some(&Value::Null));
        assert_eq!(record.get("server_instance_no"), Some(&Value::Null));
        assert_eq!(record.get_bool("is_associated"), Some(false));
    }

    #[test]
    fn test_vpc_reads_flat_server_fields() {
        let mut raw = vpc();
        raw.server_instance_no = Some("88".to_string());
        raw.server_name = Some("api-1".to_string());

        let record = VpcPublicIpNormalizer.normalize(&raw).unwrap();
        assert_eq!(record.get_str("server_instance_no"), Some("88"));
        assert_eq!(record.get_str("server_name"), Some("api-1"));
        assert_eq!(record.get_bool("is_associated"), Some(true));
        assert_eq!(record.get("instance_no"), Some(&Value::Null));
        assert_eq!(record.get("zone"), Some(&Value::Null));
    }

    #[test]
    fn test_vpc_unattached() {
        let record = VpcPublicIpNormalizer.normalize(&vpc()).unwrap();
        assert_eq!(record.get("server_instance_no"), Some(&Value::Null));
        assert_eq!(record.get_bool("is_associated"), Some(false));
        assert_eq!(record.get_str("description"), Some(""));
    }

    #[test]
    fn test_backends_share_field_names() {
        let classic = ClassicPublicIpNormalizer.normalize(&classic()).unwrap();
        let vpc = VpcPublicIpNormalizer.normalize(&vpc()).unwrap();

        let classic_names: Vec<_> = classic.field_names().collect();
        let vpc_names: Vec<_> = vpc.field_names().collect();
        assert_eq!(classic_names, vpc_names);
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let raw = classic();
        assert_eq!(
            ClassicPublicIpNormalizer.normalize(&raw).unwrap(),
            ClassicPublicIpNormalizer.normalize(&raw).unwrap()
        );
    }
}
