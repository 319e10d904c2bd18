//! Single-result resolution for singular reads.

use crate::error::{NcloudError, NcloudResult};
use crate::record::CanonicalRecord;

/// Returns the only record of `records`.
///
/// Fails with [`NcloudError::NotFound`] on an empty list and with
/// [`NcloudError::AmbiguousResult`] when more than one record matched.
pub fn resolve_one(resource: &str, mut records: Vec<CanonicalRecord>) -> NcloudResult<CanonicalRecord> {
    match records.len() {
        0 => Err(NcloudError::not_found(resource, "the given criteria")),
        1 => records
            .pop()
            .ok_or_else(|| NcloudError::internal("record list emptied during resolution")),
        count => Err(NcloudError::ambiguous(resource, count)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FieldSpec, RecordSchema};

    static SCHEMA: RecordSchema = RecordSchema {
        name: "repository",
        fields: &[FieldSpec::string("id")],
    };

    fn record(id: &str) -> CanonicalRecord {
        CanonicalRecord::new(&SCHEMA).with("id", id).unwrap()
    }

    #[test]
    fn test_zero_records() {
        let err = resolve_one("repository", vec![]).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_one_record() {
        let r = resolve_one("repository", vec![record("1")]).unwrap();
        assert_eq!(r.get_str("id"), Some("1"));
    }

    #[test]
    fn test_many_records() {
        let err = resolve_one("repository", vec![record("1"), record("2")]).unwrap_err();
        assert!(matches!(err, NcloudError::AmbiguousResult { count: 2, .. }));
    }
}
