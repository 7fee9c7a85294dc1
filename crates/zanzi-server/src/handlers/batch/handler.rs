//! Batch check handler implementation.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, instrument};

use zanzi_domain::model::TypeSystem;
use zanzi_domain::resolver::{CheckContext, CheckRequest};
use zanzi_storage::DataStore;

use super::types::{
    BatchCheckError, BatchCheckItem, BatchCheckItemResult, BatchCheckRequest, BatchCheckResponse,
    BatchCheckResult, MAX_BATCH_SIZE,
};
use crate::handlers::check::CheckHandler;

/// Key for identifying unique checks (used for deduplication).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct CheckKey<'a> {
    user: &'a str,
    relation: &'a str,
    object: &'a str,
}

impl<'a> From<&'a BatchCheckItem> for CheckKey<'a> {
    fn from(item: &'a BatchCheckItem) -> Self {
        Self {
            user: &item.user,
            relation: &item.relation,
            object: &item.object,
        }
    }
}

/// Handler for batch permission checks.
pub struct BatchCheckHandler<S: DataStore> {
    checks: Arc<CheckHandler<S>>,
}

impl<S: DataStore> BatchCheckHandler<S> {
    /// Creates a new batch check handler sharing `checks`' evaluator.
    pub fn new(checks: Arc<CheckHandler<S>>) -> Self {
        Self { checks }
    }

    /// Validates a batch check request.
    pub fn validate(&self, request: &BatchCheckRequest) -> BatchCheckResult<()> {
        if request.checks.is_empty() {
            return Err(BatchCheckError::EmptyBatch);
        }

        if request.checks.len() > MAX_BATCH_SIZE {
            return Err(BatchCheckError::BatchTooLarge {
                size: request.checks.len(),
                max: MAX_BATCH_SIZE,
            });
        }

        for (index, check) in request.checks.iter().enumerate() {
            let empty_field = if check.user.is_empty() {
                Some("user")
            } else if check.relation.is_empty() {
                Some("relation")
            } else if check.object.is_empty() {
                Some("object")
            } else {
                None
            };
            if let Some(field) = empty_field {
                return Err(BatchCheckError::InvalidCheck {
                    index,
                    message: format!("{field} cannot be empty"),
                });
            }
        }

        Ok(())
    }

    pub async fn check(&self, request: &BatchCheckRequest) -> BatchCheckResult<BatchCheckResponse> {
        self.check_with_context(request, &CheckContext::default())
            .await
    }

    /// Executes a batch check request.
    ///
    /// Each item gets its own result; a failing item carries its error
    /// message and does not affect its neighbours.
    #[instrument(skip_all, fields(size = request.checks.len()))]
    pub async fn check_with_context(
        &self,
        request: &BatchCheckRequest,
        ctx: &CheckContext,
    ) -> BatchCheckResult<BatchCheckResponse> {
        self.validate(request)?;

        let snapshot = self
            .checks
            .models()
            .get(request.authorization_model_id.as_deref())
            .await?;

        // Build a map of unique checks and track which positions map to each unique check
        let mut unique_checks: Vec<&BatchCheckItem> = Vec::new();
        let mut key_to_index: HashMap<CheckKey<'_>, usize> = HashMap::new();
        let mut position_to_unique: Vec<usize> = Vec::with_capacity(request.checks.len());

        for check in &request.checks {
            let unique_index = *key_to_index.entry(CheckKey::from(check)).or_insert_with(|| {
                unique_checks.push(check);
                unique_checks.len() - 1
            });
            position_to_unique.push(unique_index);
        }
        debug!(
            total = request.checks.len(),
            unique = unique_checks.len(),
            "deduplicated batch"
        );

        let unique_results: Vec<BatchCheckItemResult> = join_all(
            unique_checks
                .iter()
                .map(|check| self.execute_check(&snapshot.type_system, check, ctx)),
        )
        .await;

        let results = position_to_unique
            .into_iter()
            .map(|idx| unique_results[idx].clone())
            .collect();

        Ok(BatchCheckResponse { results })
    }

    async fn execute_check(
        &self,
        model: &TypeSystem,
        check: &BatchCheckItem,
        ctx: &CheckContext,
    ) -> BatchCheckItemResult {
        let outcome = match CheckRequest::parse(&check.user, &check.relation, &check.object) {
            Ok(request) => self.checks.evaluate(model, &request, ctx).await,
            Err(err) => Err(err.into()),
        };
        match outcome {
            Ok(response) => BatchCheckItemResult {
                allowed: response.allowed,
                error: None,
            },
            Err(err) => BatchCheckItemResult {
                allowed: false,
                error: Some(err.to_string()),
            },
        }
    }
}
