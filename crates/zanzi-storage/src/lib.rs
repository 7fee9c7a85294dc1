//! zanzi-storage: Storage abstraction layer
//!
//! This crate provides the tuple store and model store the check engine
//! reads from:
//! - DataStore trait for storage operations
//! - In-memory implementation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               zanzi-storage                 │
//! ├─────────────────────────────────────────────┤
//! │  traits.rs   - DataStore trait definition   │
//! │  memory.rs   - In-memory implementation     │
//! └─────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use memory::MemoryDataStore;
pub use traits::{DataStore, StoredAuthorizationModel, StoredTuple, TupleFilter};
