//! Single check handler.

use std::sync::Arc;

use tracing::instrument;

use zanzi_domain::model::TypeSystem;
use zanzi_domain::resolver::{CheckContext, CheckRequest, GraphResolver, ResolverConfig};
use zanzi_storage::DataStore;

use crate::adapters::DataStoreTupleReader;
use crate::error::ServerResult;
use crate::models::ModelRegistry;

/// A check in string form, as received from callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CheckQuery {
    /// The user performing the access (e.g., "user:alice").
    pub user: String,
    /// The relation to check (e.g., "can_view").
    pub relation: String,
    /// The object identifier (e.g., "server:lxd").
    pub object: String,
    /// Model to evaluate against; the latest model when unset.
    pub authorization_model_id: Option<String>,
}

impl CheckQuery {
    pub fn new(
        user: impl Into<String>,
        relation: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            relation: relation.into(),
            object: object.into(),
            authorization_model_id: None,
        }
    }

    pub fn with_model_id(mut self, id: impl Into<String>) -> Self {
        self.authorization_model_id = Some(id.into());
        self
    }
}

/// Result of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckResponse {
    pub allowed: bool,
}

/// Parses checks, resolves the model snapshot and runs the evaluator.
pub struct CheckHandler<S: DataStore> {
    resolver: GraphResolver<DataStoreTupleReader<S>>,
    models: Arc<ModelRegistry<S>>,
}

impl<S: DataStore> CheckHandler<S> {
    pub fn new(storage: Arc<S>, models: Arc<ModelRegistry<S>>, config: ResolverConfig) -> Self {
        Self {
            resolver: GraphResolver::with_config(
                Arc::new(DataStoreTupleReader::new(storage)),
                config,
            ),
            models,
        }
    }

    pub fn models(&self) -> &Arc<ModelRegistry<S>> {
        &self.models
    }

    pub async fn check(&self, query: &CheckQuery) -> ServerResult<CheckResponse> {
        self.check_with_context(query, &CheckContext::default()).await
    }

    /// Like [`check`](Self::check), honoring the caller's deadline and cancellation.
    #[instrument(
        skip(self, ctx),
        fields(user = %query.user, relation = %query.relation, object = %query.object)
    )]
    pub async fn check_with_context(
        &self,
        query: &CheckQuery,
        ctx: &CheckContext,
    ) -> ServerResult<CheckResponse> {
        // Malformed input fails before any store access.
        let request = CheckRequest::parse(&query.user, &query.relation, &query.object)?;
        let snapshot = self
            .models
            .get(query.authorization_model_id.as_deref())
            .await?;
        self.evaluate(&snapshot.type_system, &request, ctx).await
    }

    /// Evaluates an already parsed request against a resolved model.
    pub(crate) async fn evaluate(
        &self,
        model: &TypeSystem,
        request: &CheckRequest,
        ctx: &CheckContext,
    ) -> ServerResult<CheckResponse> {
        let result = self.resolver.check_with_context(model, request, ctx).await?;
        Ok(CheckResponse {
            allowed: result.allowed,
        })
    }
}
