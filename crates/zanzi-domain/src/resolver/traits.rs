//! Tuple store interface consumed by the resolver.

use async_trait::async_trait;

use crate::error::DomainResult;
use crate::model::{ObjectRef, Tuple, UserRef};

/// Read access to relation tuples.
///
/// The resolver only reads through this trait and never assumes a consistent
/// snapshot between calls. Implementations report backend failures as
/// `DomainError::StoreUnavailable`.
#[async_trait]
pub trait TupleReader: Send + Sync {
    /// Returns true if the exact tuple `(user, relation, object)` is stored.
    async fn exists(&self, user: &UserRef, relation: &str, object: &ObjectRef) -> DomainResult<bool>;

    /// Lists all tuples stored against `relation` on `object`.
    async fn list_tuples(&self, relation: &str, object: &ObjectRef) -> DomainResult<Vec<Tuple>>;
}
