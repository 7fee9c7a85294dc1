//! Service-layer error types.

use thiserror::Error;
use zanzi_domain::DomainError;
use zanzi_storage::StorageError;

/// Errors surfaced by the service layer.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Parsing, validation or evaluation failed in the domain layer.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The tuple or model store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A stored model could not be (de)serialized.
    #[error("model serialization error: {message}")]
    ModelSerialization { message: String },
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::ModelSerialization {
            message: err.to_string(),
        }
    }
}

/// Result type for service operations.
pub type ServerResult<T> = Result<T, ServerError>;
