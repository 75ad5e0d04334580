//! Common error types used across the workspace.
//!
//! Structural and programming errors (bad identifiers, unknown URIs, type
//! conflicts, duplicate registrations) are returned synchronously as
//! [`RcError`]. Transient conditions such as an unreachable host are not
//! errors: they are absorbed into the resource's value-state.

use crate::value::ValueType;

/// Top-level error returned by the resource framework.
#[derive(Debug, thiserror::Error)]
pub enum RcError {
    #[error("unknown resource '{uri}'")]
    UnknownResource { uri: String },

    #[error("unknown host '{id}'")]
    UnknownHost { id: String },

    #[error("unknown driver '{id}'")]
    UnknownDriver { id: String },

    #[error("value '{found}' is not compatible with type '{expected}'")]
    TypeMismatch { expected: ValueType, found: String },

    #[error("resource '{uri}' is not writable")]
    NotWritable { uri: String },

    #[error("{kind} '{id}' is already registered")]
    DuplicateId { kind: &'static str, id: String },

    #[error("validation error")]
    Validation(#[from] ValidationError),
}

/// Malformed input detected while parsing or building domain objects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("malformed resource URI '{0}'")]
    MalformedUri(String),

    #[error("malformed pattern '{0}'")]
    MalformedPattern(String),

    #[error("unknown value type '{0}'")]
    UnknownType(String),

    #[error("malformed value '{0}'")]
    MalformedValue(String),

    #[error("malformed request '{0}'")]
    MalformedRequest(String),

    #[error("malformed time specification '{0}'")]
    MalformedTime(String),
}
