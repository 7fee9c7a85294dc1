//! Check evaluation.
//!
//! The resolver answers "does user U hold relation R on object O?" by
//! walking the rewrite graph of a compiled [`TypeSystem`](crate::model::TypeSystem)
//! and reading tuples through a [`TupleReader`].

mod config;
mod context;
mod expansion;
mod graph_resolver;
mod traits;
mod types;

#[cfg(test)]
mod tests;

pub use config::{ResolverConfig, DEFAULT_MAX_DEPTH, DEFAULT_TIMEOUT};
pub use context::CheckContext;
pub use expansion::{expand, ExpandedEntry, Expansion};
pub use graph_resolver::GraphResolver;
pub use traits::TupleReader;
pub use types::{CheckRequest, CheckResult};
