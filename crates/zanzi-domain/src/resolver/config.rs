//! Configuration for the graph resolver.

use std::time::Duration;

/// Default recursion bound for a single check.
pub const DEFAULT_MAX_DEPTH: u32 = 25;

/// Default deadline for a single check.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the graph resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Maximum number of dispatch hops (computed usersets, parent links,
    /// userset tuples) a check may follow before failing with `DepthExceeded`.
    pub max_depth: u32,
    /// Deadline for check operations unless the caller supplies one.
    pub timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ResolverConfig {
    /// Creates a new configuration with the specified max depth.
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Creates a new configuration with the specified timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
