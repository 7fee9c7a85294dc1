//! Compiled, immutable authorization model.
//!
//! A `TypeSystem` is produced once from a validated [`AuthorizationModel`]
//! and then shared read-only (typically behind an `Arc`) by every check that
//! runs against it. A schema change produces a new `TypeSystem`; checks that
//! already hold a snapshot keep using it.

use std::collections::HashMap;

use crate::error::{DomainError, DomainResult};
use crate::validation::validate_model;

use super::types::{AuthorizationModel, RelationDefinition, Tuple, TypeDefinition, UserRef};

/// Relations of one type, indexed by name.
#[derive(Debug, Clone)]
pub struct CompiledType {
    name: String,
    relations: HashMap<String, RelationDefinition>,
}

impl CompiledType {
    fn from_definition(type_def: TypeDefinition) -> Self {
        Self {
            name: type_def.type_name,
            relations: type_def
                .relations
                .into_iter()
                .map(|r| (r.name.clone(), r))
                .collect(),
        }
    }

    /// The type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a relation on this type.
    pub fn relation(&self, relation: &str) -> Option<&RelationDefinition> {
        self.relations.get(relation)
    }
}

/// Validated authorization model indexed for lookups during checks.
///
/// # Example
///
/// ```ignore
/// let model = zanzi_domain::model::parse(dsl)?;
/// let type_system = TypeSystem::compile(model)?;
///
/// let admin = type_system.get_relation("server", "admin")?;
/// ```
#[derive(Debug, Clone)]
pub struct TypeSystem {
    schema_version: String,
    types: HashMap<String, CompiledType>,
}

impl TypeSystem {
    /// Validates `model` and indexes it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ModelValidation` carrying every problem found.
    pub fn compile(model: AuthorizationModel) -> DomainResult<Self> {
        validate_model(&model).map_err(|errors| DomainError::ModelValidation { errors })?;

        let types = model
            .type_definitions
            .into_iter()
            .map(|t| (t.type_name.clone(), CompiledType::from_definition(t)))
            .collect();

        Ok(Self {
            schema_version: model.schema_version,
            types,
        })
    }

    /// Schema version the model was authored against.
    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    /// Gets a type by name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnknownType` if the type does not exist in the model.
    pub fn get_type(&self, type_name: &str) -> DomainResult<&CompiledType> {
        self.types
            .get(type_name)
            .ok_or_else(|| DomainError::UnknownType {
                type_name: type_name.to_string(),
            })
    }

    /// Gets a relation definition for a specific type.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnknownType` if the type does not exist.
    /// Returns `DomainError::UnknownRelation` if the relation does not exist on the type.
    pub fn get_relation(&self, type_name: &str, relation: &str) -> DomainResult<&RelationDefinition> {
        self.get_type(type_name)?
            .relation(relation)
            .ok_or_else(|| DomainError::UnknownRelation {
                type_name: type_name.to_string(),
                relation: relation.to_string(),
            })
    }

    /// Checks if a type exists in the model.
    pub fn has_type(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Checks if a relation exists on a type.
    pub fn has_relation(&self, type_name: &str, relation: &str) -> bool {
        self.types
            .get(type_name)
            .is_some_and(|t| t.relation(relation).is_some())
    }

    /// Validates a tuple against the model before it is written.
    ///
    /// Checks that:
    /// - The object type exists and defines the relation
    /// - The user's type exists, and a userset's relation exists on it
    /// - The relation's type restrictions permit the user
    pub fn validate_tuple(&self, tuple: &Tuple) -> DomainResult<()> {
        let relation_def = self.get_relation(&tuple.object.object_type, &tuple.relation)?;

        match &tuple.user {
            UserRef::Direct(object) => {
                self.get_type(&object.object_type)?;
            }
            UserRef::Wildcard(user_type) => {
                self.get_type(user_type)?;
            }
            UserRef::Userset { object, relation } => {
                self.get_relation(&object.object_type, relation)?;
            }
        }

        if !relation_def.permits(&tuple.user) {
            return Err(DomainError::TupleNotAllowed {
                reason: format!(
                    "user '{}' is not an allowed type for {}#{}",
                    tuple.user, tuple.object.object_type, tuple.relation
                ),
            });
        }

        Ok(())
    }
}
