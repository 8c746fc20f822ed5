#![forbid(unsafe_code)]

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PlanError>;

/// Errors produced while building, validating, encoding or decoding plans.
///
/// Construction failures are split into [`PlanError::InvalidRelation`] for
/// structural problems and [`PlanError::InvalidArgument`] for bad values so
/// callers can match on the kind instead of parsing message text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A relation could not be built: missing input, missing condition,
    /// empty aggregate, bad grouping list or out-of-range output mapping.
    #[error("invalid relation: {0}")]
    InvalidRelation(String),
    /// A value handed to the builder was rejected: negative or out-of-range
    /// field index, non-boolean condition, unspecified join type.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Wire input was malformed or carried an unrecognized variant.
    #[error("decode error: {0}")]
    Decode(String),
    /// The wire serializer failed.
    #[error("encode error: {0}")]
    Encode(String),
}

impl PlanError {
    pub(crate) fn invalid_rel(msg: impl Into<String>) -> Self {
        PlanError::InvalidRelation(msg.into())
    }

    pub(crate) fn invalid_arg(msg: impl Into<String>) -> Self {
        PlanError::InvalidArgument(msg.into())
    }

    pub(crate) fn decode(msg: impl Into<String>) -> Self {
        PlanError::Decode(msg.into())
    }

    /// Returns a machine-readable code for the error variant.
    pub fn code(&self) -> &'static str {
        match self {
            PlanError::InvalidRelation(_) => "InvalidRelation",
            PlanError::InvalidArgument(_) => "InvalidArgument",
            PlanError::Decode(_) => "Decode",
            PlanError::Encode(_) => "Encode",
        }
    }

    /// Returns the bare message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            PlanError::InvalidRelation(msg)
            | PlanError::InvalidArgument(msg)
            | PlanError::Decode(msg)
            | PlanError::Encode(msg) => msg,
        }
    }

    /// Re-labels a construction failure hit while rebuilding a decoded tree.
    pub(crate) fn into_decode(self) -> Self {
        match self {
            PlanError::Decode(_) => self,
            other => PlanError::Decode(other.to_string()),
        }
    }
}

pub(crate) const NIL_INPUT: &str = "input relation must not be absent";
pub(crate) const NIL_CONDITION: &str = "cannot use absent condition in filter relation";
pub(crate) const EMIT_OUT_OF_RANGE: &str = "output mapping index out of range";
