//! Query handlers.

pub mod batch;
pub mod check;
pub mod write;

pub use batch::BatchCheckHandler;
pub use check::{CheckHandler, CheckQuery, CheckResponse};
pub use write::{TupleKey, WriteHandler, WriteRequest};
