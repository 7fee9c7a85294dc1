//! Tuple write handler.

use std::sync::Arc;

use tracing::instrument;

use zanzi_domain::model::Tuple;
use zanzi_storage::DataStore;

use crate::adapters::to_stored;
use crate::error::ServerResult;
use crate::models::ModelRegistry;

/// A tuple in string form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleKey {
    pub user: String,
    pub relation: String,
    pub object: String,
}

impl TupleKey {
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

    fn parse(&self) -> ServerResult<Tuple> {
        Ok(Tuple::parse(&self.user, &self.relation, &self.object)?)
    }
}

/// Tuples to add and remove in one call.
#[derive(Debug, Clone, Default)]
pub struct WriteRequest {
    pub writes: Vec<TupleKey>,
    pub deletes: Vec<TupleKey>,
    /// Model the writes are validated against; the latest model when unset.
    pub authorization_model_id: Option<String>,
}

impl WriteRequest {
    pub fn writes(writes: Vec<TupleKey>) -> Self {
        Self {
            writes,
            ..Self::default()
        }
    }

    pub fn deletes(deletes: Vec<TupleKey>) -> Self {
        Self {
            deletes,
            ..Self::default()
        }
    }
}

/// Validates tuples against the model and applies them to the tuple store.
pub struct WriteHandler<S: DataStore> {
    storage: Arc<S>,
    models: Arc<ModelRegistry<S>>,
}

impl<S: DataStore> WriteHandler<S> {
    pub fn new(storage: Arc<S>, models: Arc<ModelRegistry<S>>) -> Self {
        Self { storage, models }
    }

    /// Applies the request. Nothing is written if any tuple is rejected.
    ///
    /// Writes must be permitted by the model; deletes only need to be well
    /// formed so that tuples made obsolete by a model change can be removed.
    #[instrument(skip_all, fields(writes = request.writes.len(), deletes = request.deletes.len()))]
    pub async fn write(&self, request: &WriteRequest) -> ServerResult<()> {
        let snapshot = self
            .models
            .get(request.authorization_model_id.as_deref())
            .await?;

        let mut writes = Vec::with_capacity(request.writes.len());
        for key in &request.writes {
            let tuple = key.parse()?;
            snapshot.type_system.validate_tuple(&tuple)?;
            writes.push(to_stored(&tuple));
        }

        let deletes = request
            .deletes
            .iter()
            .map(|key| key.parse().map(|tuple| to_stored(&tuple)))
            .collect::<ServerResult<Vec<_>>>()?;

        self.storage.write_tuples(writes, deletes).await?;
        Ok(())
    }
}
