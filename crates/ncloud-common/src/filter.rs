//! Attribute filtering of list results.
//!
//! A [`FilterSet`] is an AND over [`FilterPredicate`]s; a predicate is an
//! OR over its acceptable values. Each value is compared against the
//! record field's string form (see [`Value::stringify`]):
//!
//! - literal mode: string equality, optionally ASCII case-insensitive
//! - regex mode: unanchored search, so `^`/`$` must be written out to pin
//!   the whole value
//!
//! Predicates are compiled against the record schema before any record is
//! inspected. Unknown field names and malformed patterns are reported as
//! errors even when the record list is empty.
//!
//! [`Value::stringify`]: crate::record::Value::stringify

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NcloudError, NcloudResult};
use crate::record::{CanonicalRecord, RecordSchema};

/// A single name/values match criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPredicate {
    /// Canonical field name.
    pub name: String,
    /// Acceptable values; any one of them must match.
    pub values: Vec<String>,
    /// Treat values as regular expressions.
    #[serde(default)]
    pub regex: bool,
    /// Ignore case when comparing.
    #[serde(default)]
    pub case_insensitive: bool,
}

impl FilterPredicate {
    /// Creates a literal-equality predicate.
    pub fn new<I, V>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
            regex: false,
            case_insensitive: false,
        }
    }

    /// Creates a predicate matching a single literal value.
    pub fn equals(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, [value.into()])
    }

    /// Switches the predicate to regex matching.
    pub fn with_regex(mut self) -> Self {
        self.regex = true;
        self
    }

    /// Makes the comparison case-insensitive.
    pub fn ignoring_case(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    fn compile(&self, schema: &RecordSchema) -> NcloudResult<CompiledPredicate> {
        let field = schema.require(&self.name)?.name;

        let matchers = self
            .values
            .iter()
            .map(|value| {
                if self.regex {
                    RegexBuilder::new(value)
                        .case_insensitive(self.case_insensitive)
                        .build()
                        .map(Matcher::Pattern)
                        .map_err(|e| NcloudError::invalid_filter(&self.name, e.to_string()))
                } else {
                    Ok(Matcher::Literal {
                        value: value.clone(),
                        case_insensitive: self.case_insensitive,
                    })
                }
            })
            .collect::<NcloudResult<Vec<_>>>()?;

        Ok(CompiledPredicate { field, matchers })
    }
}

/// Unordered collection of predicates, all of which must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    predicates: Vec<FilterPredicate>,
}

impl FilterSet {
    /// Creates an empty filter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a predicate.
    pub fn with(mut self, predicate: FilterPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Adds a predicate in place.
    pub fn push(&mut self, predicate: FilterPredicate) {
        self.predicates.push(predicate);
    }

    /// Returns true if there are no predicates.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Returns the number of predicates.
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Returns the predicates.
    pub fn predicates(&self) -> &[FilterPredicate] {
        &self.predicates
    }
}

impl FromIterator<FilterPredicate> for FilterSet {
    fn from_iter<I: IntoIterator<Item = FilterPredicate>>(iter: I) -> Self {
        Self {
            predicates: iter.into_iter().collect(),
        }
    }
}

enum Matcher {
    Literal { value: String, case_insensitive: bool },
    Pattern(Regex),
}

impl Matcher {
    fn matches(&self, candidate: &str) -> bool {
        match self {
            Matcher::Literal {
                value,
                case_insensitive: true,
            } => value.eq_ignore_ascii_case(candidate),
            Matcher::Literal { value, .. } => value == candidate,
            Matcher::Pattern(re) => re.is_match(candidate),
        }
    }
}

struct CompiledPredicate {
    field: &'static str,
    matchers: Vec<Matcher>,
}

impl CompiledPredicate {
    fn matches(&self, record: &CanonicalRecord) -> bool {
        let candidate = record
            .get(self.field)
            .map(|v| v.stringify())
            .unwrap_or_default();
        self.matchers.iter().any(|m| m.matches(&candidate))
    }
}

/// Keeps the records that satisfy every predicate of `filters`.
///
/// An empty filter set returns `records` unchanged.
pub fn apply(
    filters: &FilterSet,
    schema: &RecordSchema,
    records: Vec<CanonicalRecord>,
) -> NcloudResult<Vec<CanonicalRecord>> {
    if filters.is_empty() {
        return Ok(records);
    }

    let compiled = filters
        .predicates
        .iter()
        .map(|p| p.compile(schema))
        .collect::<NcloudResult<Vec<_>>>()?;

    let before = records.len();
    let kept: Vec<CanonicalRecord> = records
        .into_iter()
        .filter(|record| compiled.iter().all(|p| p.matches(record)))
        .collect();

    debug!(
        schema = schema.name,
        predicates = compiled.len(),
        before,
        after = kept.len(),
        "Applied filters"
    );

    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldSpec;

    static SCHEMA: RecordSchema = RecordSchema {
        name: "public ip",
        fields: &[
            FieldSpec::string("id"),
            FieldSpec::string("public_ip"),
            FieldSpec::string("server_name"),
            FieldSpec::bool("is_associated"),
        ],
    };

    fn record(id: &str, ip: &str, server: Option<&str>) -> CanonicalRecord {
        CanonicalRecord::new(&SCHEMA)
            .with("id", id)
            .unwrap()
            .with("public_ip", ip)
            .unwrap()
            .with("server_name", server)
            .unwrap()
            .with("is_associated", server.is_some())
            .unwrap()
    }

    fn records() -> Vec<CanonicalRecord> {
        vec![
            record("1", "10.0.0.1", Some("web-1")),
            record("2", "10.0.0.2", None),
            record("3", "192.168.0.3", Some("db-1")),
        ]
    }

    fn ids(records: &[CanonicalRecord]) -> Vec<&str> {
        records.iter().filter_map(|r| r.get_str("id")).collect()
    }

    #[test]
    fn test_empty_filter_set_is_noop() {
        let out = apply(&FilterSet::new(), &SCHEMA, records()).unwrap();
        assert_eq!(out, records());
    }

    #[test]
    fn test_literal_match() {
        let filters = FilterSet::new().with(FilterPredicate::equals("public_ip", "10.0.0.2"));
        let out = apply(&filters, &SCHEMA, records()).unwrap();
        assert_eq!(ids(&out), vec!["2"]);
    }

    #[test]
    fn test_values_are_ored() {
        let filters = FilterSet::new().with(FilterPredicate::new("id", ["1", "3"]));
        let out = apply(&filters, &SCHEMA, records()).unwrap();
        assert_eq!(ids(&out), vec!["1", "3"]);
    }

    #[test]
    fn test_predicates_are_anded() {
        let filters = FilterSet::new()
            .with(FilterPredicate::new("id", ["1", "2", "3"]))
            .with(FilterPredicate::equals("is_associated", "true"))
            .with(FilterPredicate::equals("public_ip", "^10\\.").with_regex());
        let out = apply(&filters, &SCHEMA, records()).unwrap();
        assert_eq!(ids(&out), vec!["1"]);
    }

    #[test]
    fn test_bool_and_null_stringification() {
        let filters = FilterSet::new().with(FilterPredicate::equals("is_associated", "false"));
        assert_eq!(ids(&apply(&filters, &SCHEMA, records()).unwrap()), vec!["2"]);

        // Null fields compare as the empty string.
        let filters = FilterSet::new().with(FilterPredicate::equals("server_name", ""));
        assert_eq!(ids(&apply(&filters, &SCHEMA, records()).unwrap()), vec!["2"]);
    }

    #[test]
    fn test_regex_is_unanchored() {
        let filters =
            FilterSet::new().with(FilterPredicate::equals("server_name", "1").with_regex());
        let out = apply(&filters, &SCHEMA, records()).unwrap();
        assert_eq!(ids(&out), vec!["1", "3"]);
    }

    #[test]
    fn test_case_insensitive() {
        let literal =
            FilterSet::new().with(FilterPredicate::equals("server_name", "WEB-1").ignoring_case());
        assert_eq!(ids(&apply(&literal, &SCHEMA, records()).unwrap()), vec!["1"]);

        let pattern = FilterSet::new().with(
            FilterPredicate::equals("server_name", "^DB-")
                .with_regex()
                .ignoring_case(),
        );
        assert_eq!(ids(&apply(&pattern, &SCHEMA, records()).unwrap()), vec!["3"]);

        let strict = FilterSet::new().with(FilterPredicate::equals("server_name", "WEB-1"));
        assert!(apply(&strict, &SCHEMA, records()).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_field_is_an_error() {
        let filters = FilterSet::new().with(FilterPredicate::equals("color", "red"));
        let err = apply(&filters, &SCHEMA, Vec::new()).unwrap_err();
        assert!(matches!(err, NcloudError::UnknownField { ref field, .. } if field == "color"));
    }

    #[test]
    fn test_invalid_regex_is_an_error() {
        let filters = FilterSet::new().with(FilterPredicate::equals("id", "(").with_regex());
        let err = apply(&filters, &SCHEMA, records()).unwrap_err();
        assert!(matches!(err, NcloudError::InvalidFilter { .. }));
    }

    #[test]
    fn test_matches_definition() {
        // apply(F, R) keeps exactly the records every predicate accepts.
        let filters = FilterSet::new()
            .with(FilterPredicate::new("is_associated", ["true"]))
            .with(FilterPredicate::new("server_name", ["db-1", "web-1"]));
        let out = apply(&filters, &SCHEMA, records()).unwrap();
        let expected: Vec<_> = records()
            .into_iter()
            .filter(|r| {
                r.get_bool("is_associated") == Some(true)
                    && matches!(r.get_str("server_name"), Some("db-1") | Some("web-1"))
            })
            .collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_deserialize_filter_set() {
        let filters: FilterSet = serde_json::from_str(
            r#"[{"name": "is_associated", "values": ["true"]},
                {"name": "public_ip", "values": ["^10"], "regex": true}]"#,
        )
        .unwrap();
        assert_eq!(filters.len(), 2);
        assert!(filters.predicates()[1].regex);
        assert!(!filters.predicates()[0].case_insensitive);
    }
}
