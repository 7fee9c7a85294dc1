//! Per-check context: caller controls and internal traversal state.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::model::ObjectRef;

/// Caller-supplied controls for a single check.
#[derive(Debug, Clone, Default)]
pub struct CheckContext {
    /// Overrides the resolver's configured timeout.
    pub timeout: Option<Duration>,
    /// Aborts the check with `DomainError::Cancelled` when triggered.
    pub cancellation: Option<CancellationToken>,
}

impl CheckContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a deadline for this check.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attaches a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}

/// Internal context for graph traversal.
#[derive(Debug, Clone)]
pub(crate) struct TraversalContext {
    /// Current traversal depth.
    pub(crate) depth: u32,
    /// `type:id#relation` keys on the active call path.
    /// Wrapped in Arc for cheap cloning when not mutating.
    pub(crate) visited: Arc<HashSet<String>>,
}

impl TraversalContext {
    pub(crate) fn new() -> Self {
        Self {
            depth: 0,
            visited: Arc::new(HashSet::new()),
        }
    }

    pub(crate) fn increment_depth(&self) -> Self {
        Self {
            depth: self.depth + 1,
            visited: Arc::clone(&self.visited),
        }
    }

    pub(crate) fn is_visited(&self, key: &str) -> bool {
        self.visited.contains(key)
    }

    pub(crate) fn with_visited(&self, key: String) -> Self {
        // Copy-on-write: siblings keep their own path.
        let mut new_visited = (*self.visited).clone();
        new_visited.insert(key);
        Self {
            depth: self.depth,
            visited: Arc::new(new_visited),
        }
    }
}

/// Key identifying a (type, id, relation) node on the call path.
pub(crate) fn visit_key(object: &ObjectRef, relation: &str) -> String {
    format!("{object}#{relation}")
}
