//! Error types for reconciliation operations.
//!
//! All errors carry the operation and the resource identity they were
//! raised for, so a failure can be remediated by hand. "Resource absent"
//! is reported as [`NcloudError::NotFound`], distinct from transport
//! failures.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for reconciliation operations.
pub type NcloudResult<T> = Result<T, NcloudError>;

/// Errors that can occur while reconciling a remote resource.
#[derive(Debug, Error)]
pub enum NcloudError {
    /// A gateway call failed (network, auth, remote 4xx/5xx).
    #[error("Remote call failed: {operation} ({identity}): {message}")]
    Transport {
        /// The gateway operation (e.g., "getRepository", "list").
        operation: String,
        /// Name or id the call was made for.
        identity: String,
        /// Error message reported by the gateway.
        message: String,
    },

    /// A singular read matched zero records.
    #[error("No {resource} found for {identity}. Please change search criteria and try again")]
    NotFound {
        /// Resource kind (e.g., "repository", "public ip").
        resource: String,
        /// What was searched for.
        identity: String,
    },

    /// A singular read matched more than one record.
    #[error("More than one {resource} found ({count}). Please change search criteria and try again")]
    AmbiguousResult {
        /// Resource kind.
        resource: String,
        /// Number of matching records.
        count: usize,
    },

    /// A wait loop exceeded its bound.
    #[error("Timed out after {timeout:?} waiting for {operation} of '{identity}' (last state: {last_state})")]
    Timeout {
        /// The wait or call that timed out (e.g., "activation").
        operation: String,
        /// Resource identity.
        identity: String,
        /// The configured bound.
        timeout: Duration,
        /// Last observed poll state, or "none" if nothing was observed.
        last_state: String,
    },

    /// The gateway rejected a create request.
    #[error("Failed to create '{identity}': {source}")]
    CreateFailed {
        /// Name of the resource being created.
        identity: String,
        /// The underlying failure.
        #[source]
        source: Box<NcloudError>,
    },

    /// The gateway rejected an update request.
    #[error("Failed to update '{identity}': {source}")]
    UpdateFailed {
        /// Name of the resource being updated.
        identity: String,
        /// The underlying failure.
        #[source]
        source: Box<NcloudError>,
    },

    /// The gateway rejected a delete request.
    #[error("Failed to delete '{identity}': {source}")]
    DeleteFailed {
        /// Name of the resource being deleted.
        identity: String,
        /// The underlying failure.
        #[source]
        source: Box<NcloudError>,
    },

    /// A refresh call failed inside a wait loop.
    #[error("Error waiting for {operation} of '{identity}': {source}")]
    WaitFailed {
        /// The wait operation (e.g., "activation", "deletion").
        operation: String,
        /// Resource identity.
        identity: String,
        /// The refresh failure.
        #[source]
        source: Box<NcloudError>,
    },

    /// A refresh reported a state that is neither pending nor the target.
    #[error("Unexpected state '{state}' during {operation} of '{identity}', wanted '{expected}'")]
    UnexpectedState {
        /// The wait operation.
        operation: String,
        /// Resource identity.
        identity: String,
        /// The state that was observed.
        state: String,
        /// The target state.
        expected: String,
    },

    /// A field name is not part of the record schema.
    #[error("Unknown field '{field}' for {schema}")]
    UnknownField {
        /// Schema name.
        schema: String,
        /// The offending field.
        field: String,
    },

    /// A value does not match the declared kind of its field.
    #[error("Field '{field}' of {schema} expects a {expected} value")]
    FieldType {
        /// Schema name.
        schema: String,
        /// The offending field.
        field: String,
        /// Declared kind.
        expected: &'static str,
    },

    /// A filter predicate cannot be compiled.
    #[error("Invalid filter on '{field}': {message}")]
    InvalidFilter {
        /// The filtered field.
        field: String,
        /// Error message.
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// Internal error (unexpected state).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl NcloudError {
    /// Creates a transport error.
    pub fn transport(
        operation: impl Into<String>,
        identity: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Transport {
            operation: operation.into(),
            identity: identity.into(),
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: impl Into<String>, identity: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            identity: identity.into(),
        }
    }

    /// Creates an ambiguous result error.
    pub fn ambiguous(resource: impl Into<String>, count: usize) -> Self {
        Self::AmbiguousResult {
            resource: resource.into(),
            count,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(
        operation: impl Into<String>,
        identity: impl Into<String>,
        timeout: Duration,
        last_state: impl Into<String>,
    ) -> Self {
        Self::Timeout {
            operation: operation.into(),
            identity: identity.into(),
            timeout,
            last_state: last_state.into(),
        }
    }

    /// Wraps a gateway failure raised by a create call.
    pub fn create_failed(identity: impl Into<String>, source: NcloudError) -> Self {
        Self::CreateFailed {
            identity: identity.into(),
            source: Box::new(source),
        }
    }

    /// Wraps a gateway failure raised by an update call.
    pub fn update_failed(identity: impl Into<String>, source: NcloudError) -> Self {
        Self::UpdateFailed {
            identity: identity.into(),
            source: Box::new(source),
        }
    }

    /// Wraps a gateway failure raised by a delete call.
    pub fn delete_failed(identity: impl Into<String>, source: NcloudError) -> Self {
        Self::DeleteFailed {
            identity: identity.into(),
            source: Box::new(source),
        }
    }

    /// Wraps a refresh failure with the wait it aborted.
    pub fn wait_failed(
        operation: impl Into<String>,
        identity: impl Into<String>,
        source: NcloudError,
    ) -> Self {
        Self::WaitFailed {
            operation: operation.into(),
            identity: identity.into(),
            source: Box::new(source),
        }
    }

    /// Creates an unknown field error.
    pub fn unknown_field(schema: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            schema: schema.into(),
            field: field.into(),
        }
    }

    /// Creates an invalid filter error.
    pub fn invalid_filter(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFilter {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this error means the resource is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, NcloudError::NotFound { .. })
    }

    /// Returns true if a later attempt of the same operation may succeed
    /// without any change in configuration.
    pub fn is_retryable(&self) -> bool {
        match self {
            NcloudError::Transport { .. } | NcloudError::Timeout { .. } => true,
            NcloudError::WaitFailed { source, .. }
            | NcloudError::UpdateFailed { source, .. }
            | NcloudError::DeleteFailed { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}
