//! In-memory storage implementation.
//!
//! Tuples are bucketed by `(object_type, object_id, relation)` so the
//! resolver's per-object reads touch a single `HashSet` instead of scanning
//! the whole store.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::instrument;

use crate::error::{StorageError, StorageResult};
use crate::traits::{
    validate_filter, validate_tuple, DataStore, StoredAuthorizationModel, StoredTuple,
    TupleFilter,
};

type BucketKey = (String, String, String);

fn bucket_key(tuple: &StoredTuple) -> BucketKey {
    (
        tuple.object_type.clone(),
        tuple.object_id.clone(),
        tuple.relation.clone(),
    )
}

/// In-memory implementation of DataStore.
///
/// # Performance Characteristics
///
/// - **Write/delete tuple**: O(1) average
/// - **Read by object and relation**: O(k) in the bucket size
/// - **Other reads**: O(N) over all tuples
#[derive(Debug, Default)]
pub struct MemoryDataStore {
    tuples: DashMap<BucketKey, HashSet<StoredTuple>>,
    authorization_models: DashMap<String, StoredAuthorizationModel>,
}

impl MemoryDataStore {
    /// Creates a new in-memory data store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory data store wrapped in Arc.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Total number of stored tuples.
    pub fn tuple_count(&self) -> usize {
        self.tuples.iter().map(|bucket| bucket.len()).sum()
    }
}

/// Sorts authorization models newest-first (created_at DESC, id DESC).
fn sort_models_newest_first(models: &mut [StoredAuthorizationModel]) {
    models.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[async_trait]
impl DataStore for MemoryDataStore {
    #[instrument(skip(self, writes, deletes), fields(writes = writes.len(), deletes = deletes.len()))]
    async fn write_tuples(
        &self,
        writes: Vec<StoredTuple>,
        deletes: Vec<StoredTuple>,
    ) -> StorageResult<()> {
        // Validate everything before touching state
        for tuple in writes.iter().chain(deletes.iter()) {
            validate_tuple(tuple)?;
        }

        for tuple in deletes {
            let key = bucket_key(&tuple);
            let now_empty = match self.tuples.get_mut(&key) {
                Some(mut bucket) => {
                    bucket.remove(&tuple);
                    bucket.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.tuples.remove_if(&key, |_, bucket| bucket.is_empty());
            }
        }

        for tuple in writes {
            self.tuples.entry(bucket_key(&tuple)).or_default().insert(tuple);
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn read_tuples(&self, filter: &TupleFilter) -> StorageResult<Vec<StoredTuple>> {
        validate_filter(filter)?;

        // Fast path: a fully keyed filter reads one bucket.
        if let (Some(object_type), Some(object_id), Some(relation)) =
            (&filter.object_type, &filter.object_id, &filter.relation)
        {
            let key = (object_type.clone(), object_id.clone(), relation.clone());
            return Ok(self
                .tuples
                .get(&key)
                .map(|bucket| {
                    bucket
                        .iter()
                        .filter(|t| filter.matches(t))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default());
        }

        Ok(self
            .tuples
            .iter()
            .flat_map(|bucket| {
                bucket
                    .value()
                    .iter()
                    .filter(|t| filter.matches(t))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect())
    }

    async fn tuple_exists(&self, tuple: &StoredTuple) -> StorageResult<bool> {
        Ok(self
            .tuples
            .get(&bucket_key(tuple))
            .map_or(false, |bucket| bucket.contains(tuple)))
    }

    // Authorization model operations

    #[instrument(skip(self, model), fields(model_id = %model.id))]
    async fn write_authorization_model(&self, model: StoredAuthorizationModel) -> StorageResult<()> {
        if model.id.is_empty() {
            return Err(StorageError::InvalidInput {
                message: "model id cannot be empty".to_string(),
            });
        }
        self.authorization_models.insert(model.id.clone(), model);
        Ok(())
    }

    async fn get_authorization_model(&self, id: &str) -> StorageResult<StoredAuthorizationModel> {
        self.authorization_models
            .get(id)
            .map(|m| m.value().clone())
            .ok_or_else(|| StorageError::ModelNotFound {
                model_id: id.to_string(),
            })
    }

    async fn get_latest_authorization_model(&self) -> StorageResult<StoredAuthorizationModel> {
        self.authorization_models
            .iter()
            .max_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            })
            .map(|m| m.value().clone())
            .ok_or(StorageError::NoModels)
    }

    async fn list_authorization_models(&self) -> StorageResult<Vec<StoredAuthorizationModel>> {
        let mut models: Vec<StoredAuthorizationModel> = self
            .authorization_models
            .iter()
            .map(|m| m.value().clone())
            .collect();
        sort_models_newest_first(&mut models);
        Ok(models)
    }
}
