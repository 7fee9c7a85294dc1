//! zanzi-server: Check service layer
//!
//! This crate wires the domain evaluator to storage:
//! - Configuration management and logging setup
//! - Storage adapter implementing the evaluator's `TupleReader`
//! - Model registry caching compiled model snapshots
//! - Check, batch check and tuple write handlers
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               zanzi-server                  │
//! ├─────────────────────────────────────────────┤
//! │  config.rs   - Configuration management     │
//! │  logging.rs  - tracing-subscriber setup     │
//! │  adapters.rs - DataStore -> TupleReader     │
//! │  models.rs   - Model registry               │
//! │  service.rs  - Handler wiring               │
//! │  handlers/   - Request handlers             │
//! │    check.rs  - Single check                 │
//! │    batch/    - Batch checks                 │
//! │    write.rs  - Tuple writes                 │
//! └─────────────────────────────────────────────┘
//! ```

pub mod adapters;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod service;

// Re-exports for convenience
pub use config::{ConfigLoadError, LoggingConfig, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use models::{ModelRegistry, ModelSnapshot};
pub use service::CheckService;
