//! Batch check handler with intra-batch deduplication.
//!
//! Identical checks in one batch execute once; unique checks run
//! concurrently against a single model snapshot, and results come back in
//! request order.

mod handler;
mod types;

pub use handler::BatchCheckHandler;
pub use types::{
    BatchCheckError, BatchCheckItem, BatchCheckItemResult, BatchCheckRequest, BatchCheckResponse,
    BatchCheckResult, MAX_BATCH_SIZE,
};
