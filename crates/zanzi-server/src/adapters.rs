//! Adapters that bridge the storage layer to the domain layer.
//!
//! The evaluator reads tuples through `zanzi_domain::resolver::TupleReader`;
//! storage backends implement `zanzi_storage::DataStore`. The adapter here
//! connects the two and owns the conversion between the typed `Tuple` and
//! the column-shaped `StoredTuple`.

use std::sync::Arc;

use async_trait::async_trait;

use zanzi_domain::error::{DomainError, DomainResult};
use zanzi_domain::model::{ObjectRef, Tuple, UserRef};
use zanzi_domain::resolver::TupleReader;
use zanzi_storage::{DataStore, StorageError, StoredTuple, TupleFilter};

const WILDCARD_ID: &str = "*";

/// Converts a domain tuple into its storage form.
pub fn to_stored(tuple: &Tuple) -> StoredTuple {
    let (user_type, user_id, user_relation) = match &tuple.user {
        UserRef::Direct(user) => (user.object_type.clone(), user.object_id.clone(), None),
        UserRef::Wildcard(user_type) => (user_type.clone(), WILDCARD_ID.to_string(), None),
        UserRef::Userset { object, relation } => (
            object.object_type.clone(),
            object.object_id.clone(),
            Some(relation.clone()),
        ),
    };
    StoredTuple {
        object_type: tuple.object.object_type.clone(),
        object_id: tuple.object.object_id.clone(),
        relation: tuple.relation.clone(),
        user_type,
        user_id,
        user_relation,
    }
}

/// Converts a stored tuple back into the domain form.
pub fn from_stored(stored: StoredTuple) -> Tuple {
    let user = match stored.user_relation {
        Some(relation) => UserRef::userset(ObjectRef::new(stored.user_type, stored.user_id), relation),
        None if stored.user_id == WILDCARD_ID => UserRef::wildcard(stored.user_type),
        None => UserRef::direct(stored.user_type, stored.user_id),
    };
    Tuple::new(
        user,
        stored.relation,
        ObjectRef::new(stored.object_type, stored.object_id),
    )
}

fn store_unavailable(err: StorageError) -> DomainError {
    DomainError::StoreUnavailable {
        message: err.to_string(),
    }
}

/// Adapter that implements `TupleReader` using a `DataStore`.
pub struct DataStoreTupleReader<S: DataStore> {
    storage: Arc<S>,
}

impl<S: DataStore> DataStoreTupleReader<S> {
    /// Creates a new adapter wrapping the given storage.
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl<S: DataStore> TupleReader for DataStoreTupleReader<S> {
    async fn exists(&self, user: &UserRef, relation: &str, object: &ObjectRef) -> DomainResult<bool> {
        let stored = to_stored(&Tuple::new(user.clone(), relation, object.clone()));
        self.storage
            .tuple_exists(&stored)
            .await
            .map_err(store_unavailable)
    }

    async fn list_tuples(&self, relation: &str, object: &ObjectRef) -> DomainResult<Vec<Tuple>> {
        let filter = TupleFilter::for_object_relation(
            object.object_type.as_str(),
            object.object_id.as_str(),
            relation,
        );
        let tuples = self
            .storage
            .read_tuples(&filter)
            .await
            .map_err(store_unavailable)?;
        Ok(tuples.into_iter().map(from_stored).collect())
    }
}
