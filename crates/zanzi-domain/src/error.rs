//! Domain error types for authorization operations.

use thiserror::Error;

use crate::validation::ValidationError;

/// Domain-specific errors for authorization operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Error parsing authorization model DSL or JSON.
    #[error("model parse error: {message}")]
    ModelParseError { message: String },

    /// The model failed compile-time validation.
    #[error("model validation error: {}", join_errors(.errors))]
    ModelValidation { errors: Vec<ValidationError> },

    /// Recursion guard tripped during graph traversal.
    #[error("depth limit exceeded (max: {max_depth})")]
    DepthExceeded { max_depth: u32 },

    /// The check deadline elapsed before a definite answer was reached.
    #[error("deadline exceeded after {duration_ms}ms")]
    DeadlineExceeded { duration_ms: u64 },

    /// The caller cancelled the check.
    #[error("check cancelled")]
    Cancelled,

    /// The tuple store failed to answer a sub-query.
    #[error("tuple store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// Invalid user format.
    #[error("invalid user format: {value}")]
    InvalidUserFormat { value: String },

    /// Invalid object format.
    #[error("invalid object format: {value}")]
    InvalidObjectFormat { value: String },

    /// Invalid relation format.
    #[error("invalid relation format: {value}")]
    InvalidRelationFormat { value: String },

    /// Type not found in authorization model.
    #[error("type not found: {type_name}")]
    UnknownType { type_name: String },

    /// Relation not found on type.
    #[error("relation '{relation}' not found on type '{type_name}'")]
    UnknownRelation { type_name: String, relation: String },

    /// Tuple rejected by the model's type restrictions.
    #[error("tuple not allowed by model: {reason}")]
    TupleNotAllowed { reason: String },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
