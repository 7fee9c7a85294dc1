//! DataStore trait definition.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// Filter for reading tuples. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TupleFilter {
    /// Filter by object type.
    pub object_type: Option<String>,
    /// Filter by object ID. Requires `object_type`.
    pub object_id: Option<String>,
    /// Filter by relation.
    pub relation: Option<String>,
    /// Filter by user in its string form ("user:alice", "group:g#member").
    pub user: Option<String>,
}

impl TupleFilter {
    /// Filter for every tuple stored against `relation` on one object.
    pub fn for_object_relation(
        object_type: impl Into<String>,
        object_id: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            object_type: Some(object_type.into()),
            object_id: Some(object_id.into()),
            relation: Some(relation.into()),
            user: None,
        }
    }

    /// Returns true if `tuple` passes the filter.
    pub fn matches(&self, tuple: &StoredTuple) -> bool {
        self.object_type
            .as_deref()
            .map_or(true, |t| t == tuple.object_type)
            && self
                .object_id
                .as_deref()
                .map_or(true, |id| id == tuple.object_id)
            && self
                .relation
                .as_deref()
                .map_or(true, |r| r == tuple.relation)
            && self
                .user
                .as_deref()
                .map_or(true, |u| u == tuple.user_string())
    }
}

/// A stored tuple, split into the columns a backend indexes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoredTuple {
    pub object_type: String,
    pub object_id: String,
    pub relation: String,
    pub user_type: String,
    /// User id, or "*" for a wildcard.
    pub user_id: String,
    /// Set for userset users ("group:g#member").
    pub user_relation: Option<String>,
}

impl StoredTuple {
    pub fn new(
        object_type: impl Into<String>,
        object_id: impl Into<String>,
        relation: impl Into<String>,
        user_type: impl Into<String>,
        user_id: impl Into<String>,
        user_relation: Option<String>,
    ) -> Self {
        Self {
            object_type: object_type.into(),
            object_id: object_id.into(),
            relation: relation.into(),
            user_type: user_type.into(),
            user_id: user_id.into(),
            user_relation,
        }
    }

    /// The user in its string form.
    pub fn user_string(&self) -> String {
        match &self.user_relation {
            Some(relation) => format!("{}:{}#{}", self.user_type, self.user_id, relation),
            None => format!("{}:{}", self.user_type, self.user_id),
        }
    }
}

impl fmt::Display for StoredTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}#{}@{}",
            self.object_type,
            self.object_id,
            self.relation,
            self.user_string()
        )
    }
}

/// A serialized authorization model as kept by the model store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAuthorizationModel {
    /// Time-ordered model id.
    pub id: String,
    pub schema_version: String,
    /// The model's JSON serialization.
    pub model_json: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Rejects tuples with empty required fields.
pub fn validate_tuple(tuple: &StoredTuple) -> StorageResult<()> {
    let required = [
        ("object_type", &tuple.object_type),
        ("object_id", &tuple.object_id),
        ("relation", &tuple.relation),
        ("user_type", &tuple.user_type),
        ("user_id", &tuple.user_id),
    ];
    for (field, value) in required {
        if value.is_empty() {
            return Err(StorageError::InvalidInput {
                message: format!("{field} cannot be empty"),
            });
        }
    }
    if tuple.user_relation.as_deref() == Some("") {
        return Err(StorageError::InvalidInput {
            message: "user_relation cannot be empty when set".to_string(),
        });
    }
    Ok(())
}

/// Rejects filters that cannot be served.
pub fn validate_filter(filter: &TupleFilter) -> StorageResult<()> {
    if filter.object_id.is_some() && filter.object_type.is_none() {
        return Err(StorageError::InvalidFilter {
            message: "object_id filter requires object_type".to_string(),
        });
    }
    Ok(())
}

/// Abstract storage interface for tuples and authorization models.
///
/// Implementations must be thread-safe (Send + Sync) and support
/// async operations.
#[async_trait]
pub trait DataStore: Send + Sync + 'static {
    // Tuple operations

    /// Applies deletes then writes. Both are idempotent: writing a stored
    /// tuple or deleting a missing one is not an error.
    async fn write_tuples(
        &self,
        writes: Vec<StoredTuple>,
        deletes: Vec<StoredTuple>,
    ) -> StorageResult<()>;

    /// Reads tuples matching the filter.
    async fn read_tuples(&self, filter: &TupleFilter) -> StorageResult<Vec<StoredTuple>>;

    /// Returns true if the exact tuple is stored.
    async fn tuple_exists(&self, tuple: &StoredTuple) -> StorageResult<bool> {
        let filter = TupleFilter {
            user: Some(tuple.user_string()),
            ..TupleFilter::for_object_relation(
                tuple.object_type.as_str(),
                tuple.object_id.as_str(),
                tuple.relation.as_str(),
            )
        };
        Ok(!self.read_tuples(&filter).await?.is_empty())
    }

    // Model operations

    /// Stores a model.
    async fn write_authorization_model(&self, model: StoredAuthorizationModel) -> StorageResult<()>;

    /// Gets a model by id.
    async fn get_authorization_model(&self, id: &str) -> StorageResult<StoredAuthorizationModel>;

    /// Gets the most recently written model.
    async fn get_latest_authorization_model(&self) -> StorageResult<StoredAuthorizationModel>;

    /// Lists models newest-first.
    async fn list_authorization_models(&self) -> StorageResult<Vec<StoredAuthorizationModel>>;
}
