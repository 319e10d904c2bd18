//! Verification helpers for canonical records

use ncloud_common::{CanonicalRecord, Value};
use thiserror::Error;

/// Verification error types
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Field '{field}' is not part of schema '{schema}'")]
    FieldNotFound { schema: String, field: String },

    #[error("Value mismatch for {field}: expected '{expected}', got '{actual}'")]
    ValueMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Record {index} has fields {actual:?}, expected {expected:?}")]
    FieldSetMismatch {
        index: usize,
        expected: Vec<String>,
        actual: Vec<String>,
    },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Record assertion helper
pub struct RecordVerifier<'a> {
    record: &'a CanonicalRecord,
}

impl<'a> RecordVerifier<'a> {
    pub fn new(record: &'a CanonicalRecord) -> Self {
        Self { record }
    }

    fn value(&self, field: &str) -> VerifyResult<&'a Value> {
        self.record
            .get(field)
            .ok_or_else(|| VerificationError::FieldNotFound {
                schema: self.record.schema().name.to_string(),
                field: field.to_string(),
            })
    }

    /// Asserts the stringified value of `field`
    pub fn assert_field_value(&self, field: &str, expected: &str) -> VerifyResult<()> {
        let actual = self.value(field)?.stringify();
        if actual != expected {
            return Err(VerificationError::ValueMismatch {
                field: field.to_string(),
                expected: expected.to_string(),
                actual,
            });
        }
        Ok(())
    }

    /// Asserts that `field` is null
    pub fn assert_null(&self, field: &str) -> VerifyResult<()> {
        let value = self.value(field)?;
        if !value.is_null() {
            return Err(VerificationError::ValueMismatch {
                field: field.to_string(),
                expected: "null".to_string(),
                actual: value.stringify(),
            });
        }
        Ok(())
    }
}

/// Asserts that every record carries the field names of the first one
pub fn assert_uniform_field_names(records: &[CanonicalRecord]) -> VerifyResult<()> {
    let Some(first) = records.first() else {
        return Ok(());
    };
    let expected: Vec<String> = first.field_names().map(str::to_string).collect();

    for (index, record) in records.iter().enumerate().skip(1) {
        let actual: Vec<String> = record.field_names().map(str::to_string).collect();
        if actual != expected {
            return Err(VerificationError::FieldSetMismatch {
                index,
                expected,
                actual,
            });
        }
    }
    Ok(())
}
