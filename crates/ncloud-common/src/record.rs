//! Canonical record: the flavor-independent shape of a remote resource.
//!
//! A record is a flat mapping from field name to [`Value`] whose field set
//! is fixed by a [`RecordSchema`]. Every field starts out as
//! [`Value::Null`], so two records of the same schema always expose the
//! same field names, whichever backend they were normalized from.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{NcloudError, NcloudResult};

/// Declared kind of a canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// String-valued field.
    String,
    /// Boolean field.
    Bool,
}

impl FieldKind {
    fn as_str(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Bool => "bool",
        }
    }
}

/// A single field declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name as exposed to callers and filters.
    pub name: &'static str,
    /// Value kind.
    pub kind: FieldKind,
}

impl FieldSpec {
    /// Declares a string field.
    pub const fn string(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::String,
        }
    }

    /// Declares a boolean field.
    pub const fn bool(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Bool,
        }
    }
}

/// Fixed field set of one resource kind.
#[derive(Debug, PartialEq, Eq)]
pub struct RecordSchema {
    /// Resource kind (used in error messages).
    pub name: &'static str,
    /// Declared fields.
    pub fields: &'static [FieldSpec],
}

impl RecordSchema {
    /// Looks up a field declaration.
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Looks up a field declaration, failing on unknown names.
    pub fn require(&self, name: &str) -> NcloudResult<&'static FieldSpec> {
        self.field(name)
            .ok_or_else(|| NcloudError::unknown_field(self.name, name))
    }

    /// Returns the declared field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }
}

/// A canonical field value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    /// String value.
    String(String),
    /// Boolean value.
    Bool(bool),
    /// Absent value.
    #[default]
    Null,
}

impl Value {
    /// Returns the string form used by filters: booleans become
    /// `"true"`/`"false"` and null becomes the empty string.
    pub fn stringify(&self) -> String {
        self.to_string()
    }

    /// Returns true if the value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn fits(&self, kind: FieldKind) -> bool {
        matches!(
            (self, kind),
            (Value::Null, _) | (Value::String(_), FieldKind::String) | (Value::Bool(_), FieldKind::Bool)
        )
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::String(s) => serializer.serialize_str(s),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Null => serializer.serialize_none(),
        }
    }
}

/// Normalized resource record with a schema-checked field set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRecord {
    schema: &'static RecordSchema,
    values: BTreeMap<&'static str, Value>,
}

impl CanonicalRecord {
    /// Creates a record with every schema field set to null.
    pub fn new(schema: &'static RecordSchema) -> Self {
        let values = schema.field_names().map(|name| (name, Value::Null)).collect();
        Self { schema, values }
    }

    /// Returns the schema this record conforms to.
    pub fn schema(&self) -> &'static RecordSchema {
        self.schema
    }

    /// Assigns a field, checking the name and the value kind.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> NcloudResult<()> {
        let spec = self.schema.require(field)?;
        let value = value.into();
        if !value.fits(spec.kind) {
            return Err(NcloudError::FieldType {
                schema: self.schema.name.to_string(),
                field: field.to_string(),
                expected: spec.kind.as_str(),
            });
        }
        self.values.insert(spec.name, value);
        Ok(())
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> NcloudResult<Self> {
        self.set(field, value)?;
        Ok(self)
    }

    /// Returns a field value, or `None` if the field is not in the schema.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Returns a string field, or `None` if it is null or not a string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        match self.values.get(field) {
            Some(Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns a boolean field, or `None` if it is null or not a boolean.
    pub fn get_bool(&self, field: &str) -> Option<bool> {
        match self.values.get(field) {
            Some(Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Returns the string form of a field, failing on unknown names.
    pub fn stringified(&self, field: &str) -> NcloudResult<String> {
        self.values
            .get(field)
            .map(Value::stringify)
            .ok_or_else(|| NcloudError::unknown_field(self.schema.name, field))
    }

    /// Returns the field names of this record (always the schema's).
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.keys().copied()
    }

    /// Iterates over field/value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> + '_ {
        self.values.iter().map(|(k, v)| (*k, v))
    }
}

impl Serialize for CanonicalRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (k, v) in &self.values {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static TEST_SCHEMA: RecordSchema = RecordSchema {
        name: "widget",
        fields: &[
            FieldSpec::string("id"),
            FieldSpec::string("name"),
            FieldSpec::bool("enabled"),
        ],
    };

    #[test]
    fn test_new_record_is_all_null() {
        let record = CanonicalRecord::new(&TEST_SCHEMA);
        let names: Vec<_> = record.field_names().collect();
        assert_eq!(names, vec!["enabled", "id", "name"]);
        assert!(record.iter().all(|(_, v)| v.is_null()));
    }

    #[test]
    fn test_set_and_get() {
        let record = CanonicalRecord::new(&TEST_SCHEMA)
            .with("id", "7")
            .unwrap()
            .with("enabled", true)
            .unwrap();

        assert_eq!(record.get_str("id"), Some("7"));
        assert_eq!(record.get_bool("enabled"), Some(true));
        assert_eq!(record.get_str("name"), None);
        assert_eq!(record.get("name"), Some(&Value::Null));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn test_set_unknown_field() {
        let mut record = CanonicalRecord::new(&TEST_SCHEMA);
        let err = record.set("color", "red").unwrap_err();
        assert!(matches!(err, NcloudError::UnknownField { .. }));
    }

    #[test]
    fn test_set_wrong_kind() {
        let mut record = CanonicalRecord::new(&TEST_SCHEMA);
        let err = record.set("enabled", "yes").unwrap_err();
        assert!(matches!(err, NcloudError::FieldType { expected: "bool", .. }));

        // Null fits any kind.
        record.set("enabled", Value::Null).unwrap();
    }

    #[test]
    fn test_stringified() {
        let record = CanonicalRecord::new(&TEST_SCHEMA)
            .with("enabled", false)
            .unwrap();
        assert_eq!(record.stringified("enabled").unwrap(), "false");
        assert_eq!(record.stringified("name").unwrap(), "");
        assert!(record.stringified("color").is_err());
    }

    #[test]
    fn test_option_into_value() {
        let none: Option<&str> = None;
        assert_eq!(Value::from(none), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::String("x".to_string()));
    }

    #[test]
    fn test_serialize_flat_map() {
        let record = CanonicalRecord::new(&TEST_SCHEMA)
            .with("id", "7")
            .unwrap()
            .with("enabled", true)
            .unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "7", "name": null, "enabled": true})
        );
    }
}
