//! zanzi-domain: Core authorization domain logic
//!
//! This crate contains the relationship-based authorization core:
//! - Identifier model and authorization model types
//! - DSL and JSON model parsers
//! - Model validation and the compiled, immutable type system
//! - Graph resolver for permission checks
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                zanzi-domain                 │
//! ├─────────────────────────────────────────────┤
//! │  model/      - Types, parsers, TypeSystem   │
//! │  validation/ - Compile-time model checks    │
//! │  resolver/   - Check evaluation engine      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Storage stays outside this crate: the resolver reads tuples through the
//! [`resolver::TupleReader`] trait.

pub mod error;
pub mod model;
pub mod resolver;
pub mod validation;

// Re-export commonly used types at the crate root
pub use error::{DomainError, DomainResult};
