//! Graph resolver for permission checks.
//!
//! The resolver interprets a relation's rewrite expression against the tuple
//! store to decide whether a user holds the relation on an object.
//!
//! # Design
//!
//! - **Parallel Execution**: union and intersection operands, userset tuples
//!   and parent links are evaluated concurrently through `FuturesUnordered`.
//!   The first definite answer wins and dropping the set cancels the rest.
//!
//! - **Cycle Detection**: every `type:id#relation` on the active call path is
//!   tracked. Re-entering one evaluates to `false`.
//!
//! - **Depth Limiting**: dispatch hops are bounded by `max_depth` (default 25).
//!   Exceeding it fails with `DepthExceeded`, never a silent `false`.
//!
//! - **Deadline and Cancellation**: a check is bounded by a timeout and an
//!   optional cancellation token; either aborts the whole traversal.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::timeout;
use tracing::{debug, instrument, trace, warn};

use crate::error::{DomainError, DomainResult};
use crate::model::{ObjectRef, RelationDefinition, RewriteExpr, TypeSystem, UserRef};

use super::config::ResolverConfig;
use super::context::{visit_key, CheckContext, TraversalContext};
use super::expansion::{expand, ExpandedEntry};
use super::traits::TupleReader;
use super::types::{CheckRequest, CheckResult};

/// Type alias for boxed future to handle async recursion.
type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type Branches<'a> = FuturesUnordered<BoxFuture<'a, DomainResult<bool>>>;

/// Resolves to true on the first branch that does; errors abort immediately.
async fn any_branch(mut branches: Branches<'_>) -> DomainResult<bool> {
    while let Some(result) = branches.next().await {
        if result? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Resolves to false on the first branch that does; errors abort immediately.
async fn all_branches(mut branches: Branches<'_>) -> DomainResult<bool> {
    while let Some(result) = branches.next().await {
        if !result? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Graph resolver for permission checks.
///
/// The model is passed per call so that each check runs against the snapshot
/// the caller resolved; the resolver itself holds no model state.
pub struct GraphResolver<T> {
    tuple_reader: Arc<T>,
    config: ResolverConfig,
}

impl<T> GraphResolver<T>
where
    T: TupleReader,
{
    /// Creates a new graph resolver.
    pub fn new(tuple_reader: Arc<T>) -> Self {
        Self::with_config(tuple_reader, ResolverConfig::default())
    }

    /// Creates a new graph resolver with custom configuration.
    pub fn with_config(tuple_reader: Arc<T>, config: ResolverConfig) -> Self {
        Self {
            tuple_reader,
            config,
        }
    }

    /// Returns the resolver configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Checks if the request's user holds the relation on the object.
    pub async fn check(&self, model: &TypeSystem, request: &CheckRequest) -> DomainResult<CheckResult> {
        self.check_with_context(model, request, &CheckContext::default())
            .await
    }

    /// Like [`check`](Self::check), honoring the caller's deadline and cancellation.
    ///
    /// # Errors
    ///
    /// - `UnknownType` / `UnknownRelation` if the object type or relation is not in `model`
    /// - `DepthExceeded` if the traversal needs more than `max_depth` hops
    /// - `StoreUnavailable` if a tuple read fails
    /// - `DeadlineExceeded` / `Cancelled` if the caller's controls fire first
    #[instrument(
        skip_all,
        fields(user = %request.user, relation = %request.relation, object = %request.object)
    )]
    pub async fn check_with_context(
        &self,
        model: &TypeSystem,
        request: &CheckRequest,
        ctx: &CheckContext,
    ) -> DomainResult<CheckResult> {
        model.get_relation(&request.object.object_type, &request.relation)?;

        let deadline = ctx.timeout.unwrap_or(self.config.timeout);
        let traversal = self.resolve_check(
            model,
            &request.user,
            &request.object,
            &request.relation,
            TraversalContext::new(),
        );
        let bounded = async {
            match timeout(deadline, traversal).await {
                Ok(result) => result,
                Err(_) => {
                    let duration_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX);
                    warn!(duration_ms, "check deadline exceeded");
                    Err(DomainError::DeadlineExceeded { duration_ms })
                }
            }
        };

        let allowed = match &ctx.cancellation {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        warn!("check cancelled by caller");
                        Err(DomainError::Cancelled)
                    }
                    result = bounded => result,
                }
            }
            None => bounded.await,
        }?;

        debug!(allowed, "check resolved");
        Ok(CheckResult { allowed })
    }

    /// Resolves `relation` on `object` for `user`.
    fn resolve_check<'a>(
        &'a self,
        model: &'a TypeSystem,
        user: &'a UserRef,
        object: &'a ObjectRef,
        relation: &'a str,
        ctx: TraversalContext,
    ) -> BoxFuture<'a, DomainResult<bool>> {
        Box::pin(async move {
            if ctx.depth >= self.config.max_depth {
                return Err(DomainError::DepthExceeded {
                    max_depth: self.config.max_depth,
                });
            }

            let key = visit_key(object, relation);
            if ctx.is_visited(&key) {
                trace!(%key, "cycle on call path, treating as not satisfied");
                return Ok(false);
            }

            let relation_def = match model.get_relation(&object.object_type, relation) {
                Ok(relation_def) => relation_def,
                // Only stored data can lead below the root to a name the model lacks.
                Err(
                    err @ (DomainError::UnknownType { .. } | DomainError::UnknownRelation { .. }),
                ) if ctx.depth > 0 => {
                    warn!(%object, relation, error = %err, "tuple references undefined model entry");
                    return Ok(false);
                }
                Err(err) => return Err(err),
            };

            let ctx = ctx.with_visited(key);
            self.resolve_rewrite(model, user, object, relation_def, &relation_def.rewrite, ctx)
                .await
        })
    }

    /// Evaluates one node of a rewrite expression.
    fn resolve_rewrite<'a>(
        &'a self,
        model: &'a TypeSystem,
        user: &'a UserRef,
        object: &'a ObjectRef,
        relation_def: &'a RelationDefinition,
        rewrite: &'a RewriteExpr,
        ctx: TraversalContext,
    ) -> BoxFuture<'a, DomainResult<bool>> {
        Box::pin(async move {
            match rewrite {
                RewriteExpr::This => self.resolve_direct(model, user, object, relation_def, ctx).await,
                RewriteExpr::ComputedUserset { relation } => {
                    self.resolve_check(model, user, object, relation, ctx.increment_depth())
                        .await
                }
                RewriteExpr::TupleToUserset {
                    tupleset,
                    computed_userset,
                } => {
                    self.resolve_tuple_to_userset(model, user, object, tupleset, computed_userset, ctx)
                        .await
                }
                RewriteExpr::Union { children } => {
                    let branches = children
                        .iter()
                        .map(|child| {
                            self.resolve_rewrite(model, user, object, relation_def, child, ctx.clone())
                        })
                        .collect();
                    any_branch(branches).await
                }
                RewriteExpr::Intersection { children } => {
                    let branches = children
                        .iter()
                        .map(|child| {
                            self.resolve_rewrite(model, user, object, relation_def, child, ctx.clone())
                        })
                        .collect();
                    all_branches(branches).await
                }
                RewriteExpr::Exclusion { base, subtract } => {
                    let base_allowed = self
                        .resolve_rewrite(model, user, object, relation_def, base, ctx.clone())
                        .await?;
                    if !base_allowed {
                        return Ok(false);
                    }
                    let subtracted = self
                        .resolve_rewrite(model, user, object, relation_def, subtract, ctx)
                        .await?;
                    Ok(!subtracted)
                }
            }
        })
    }

    /// Direct tuples: literal match, wildcard match, or membership in a stored userset.
    async fn resolve_direct(
        &self,
        model: &TypeSystem,
        user: &UserRef,
        object: &ObjectRef,
        relation_def: &RelationDefinition,
        ctx: TraversalContext,
    ) -> DomainResult<bool> {
        let relation = relation_def.name.as_str();

        if relation_def.permits(user) && self.tuple_reader.exists(user, relation, object).await? {
            return Ok(true);
        }

        let expansion = expand(self.tuple_reader.as_ref(), relation, object).await?;
        let nested_ctx = ctx.increment_depth();
        let nested: Branches<'_> = FuturesUnordered::new();

        for entry in expansion.iter() {
            match entry {
                ExpandedEntry::Direct(_) => {
                    if entry.is_literally(user) && relation_def.permits(user) {
                        return Ok(true);
                    }
                }
                ExpandedEntry::Wildcard(user_type) => {
                    let type_matches =
                        matches!(user, UserRef::Direct(u) if u.object_type == user_type);
                    if (type_matches || entry.is_literally(user))
                        && relation_def.accepts_wildcard(user_type)
                    {
                        return Ok(true);
                    }
                }
                ExpandedEntry::Userset {
                    object: userset_object,
                    relation: userset_relation,
                } => {
                    if !relation_def.permits_userset(&userset_object.object_type, userset_relation) {
                        trace!(%userset_object, userset_relation, "userset tuple not allowed by restrictions");
                        continue;
                    }
                    if entry.is_literally(user) {
                        return Ok(true);
                    }
                    nested.push(self.resolve_check(
                        model,
                        user,
                        userset_object,
                        userset_relation,
                        nested_ctx.clone(),
                    ));
                }
            }
        }

        any_branch(nested).await
    }

    /// Follows every parent linked through `tupleset` and checks `computed` there.
    async fn resolve_tuple_to_userset(
        &self,
        model: &TypeSystem,
        user: &UserRef,
        object: &ObjectRef,
        tupleset: &str,
        computed: &str,
        ctx: TraversalContext,
    ) -> DomainResult<bool> {
        let expansion = expand(self.tuple_reader.as_ref(), tupleset, object).await?;
        let nested_ctx = ctx.increment_depth();

        let branches: Branches<'_> = expansion
            .direct_objects()
            .filter(|parent| {
                let defined = model.has_relation(&parent.object_type, computed);
                if !defined {
                    trace!(%parent, computed, "parent type lacks computed relation");
                }
                defined
            })
            .map(|parent| self.resolve_check(model, user, parent, computed, nested_ctx.clone()))
            .collect();

        any_branch(branches).await
    }
}
