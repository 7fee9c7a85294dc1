//! Data types for batch check operations.

/// Maximum number of checks per batch.
pub const MAX_BATCH_SIZE: usize = 50;

/// A single check within a batch request.
#[derive(Debug, Clone)]
pub struct BatchCheckItem {
    /// The user performing the access (e.g., "user:alice").
    pub user: String,
    /// The relation to check (e.g., "can_view").
    pub relation: String,
    /// The object identifier (e.g., "instance:instance01").
    pub object: String,
}

impl BatchCheckItem {
    pub fn new(
        user: impl Into<String>,
        relation: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            relation: relation.into(),
            object: object.into(),
        }
    }
}

/// Request for batch permission checks.
#[derive(Debug, Clone, Default)]
pub struct BatchCheckRequest {
    /// The list of checks to perform.
    pub checks: Vec<BatchCheckItem>,
    /// Model every check is evaluated against; the latest model when unset.
    pub authorization_model_id: Option<String>,
}

impl BatchCheckRequest {
    /// Creates a new batch check request against the latest model.
    pub fn new(checks: Vec<BatchCheckItem>) -> Self {
        Self {
            checks,
            authorization_model_id: None,
        }
    }
}

/// Result of a single check within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCheckItemResult {
    /// Whether the check is allowed. Always false when `error` is set.
    pub allowed: bool,
    /// Error message if the check failed.
    pub error: Option<String>,
}

/// Response from a batch check operation.
#[derive(Debug, Clone)]
pub struct BatchCheckResponse {
    /// Results for each check, in the same order as the request.
    pub results: Vec<BatchCheckItemResult>,
}

/// Errors that fail a batch as a whole.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BatchCheckError {
    /// The batch request is empty.
    #[error("batch request cannot be empty")]
    EmptyBatch,

    /// The batch request exceeds the maximum allowed size.
    #[error("batch size {size} exceeds maximum allowed {max}")]
    BatchTooLarge { size: usize, max: usize },

    /// A check item has invalid format.
    #[error("invalid check at index {index}: {message}")]
    InvalidCheck { index: usize, message: String },

    /// The model the batch targets could not be resolved.
    #[error("authorization model unavailable: {message}")]
    ModelUnavailable { message: String },
}

impl From<crate::error::ServerError> for BatchCheckError {
    fn from(err: crate::error::ServerError) -> Self {
        BatchCheckError::ModelUnavailable {
            message: err.to_string(),
        }
    }
}

/// Result type for batch check operations.
pub type BatchCheckResult<T> = Result<T, BatchCheckError>;
