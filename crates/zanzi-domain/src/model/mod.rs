//! Authorization model types, authoring formats and the compiled type system.
//!
//! This module contains:
//! - Identifier types (ObjectRef, UserRef, Tuple)
//! - Authorization model structures and rewrite expressions
//! - DSL and JSON parsers
//! - The compiled, immutable `TypeSystem`

mod json;
mod parser;
mod type_system;
mod types;
#[cfg(test)]
mod types_proptest;

use std::path::Path;

pub use json::parse_json;
pub use parser::{parse, ParserError, ParserResult};
pub use type_system::{CompiledType, TypeSystem};
pub use types::*;

use crate::error::{DomainError, DomainResult};

/// Reads a model file; `.json` files use the JSON format, anything else the DSL.
pub fn load_model_file(path: impl AsRef<Path>) -> DomainResult<AuthorizationModel> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| DomainError::ModelParseError {
        message: format!("failed to read model file {}: {e}", path.display()),
    })?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        parse_json(&contents)
    } else {
        Ok(parse(&contents)?)
    }
}
