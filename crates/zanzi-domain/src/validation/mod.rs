//! Authorization model validation.
//!
//! Validates that authorization models are semantically correct:
//! - Type and relation names are unique
//! - All referenced types exist
//! - All referenced relations exist on the type they are resolved against
//!
//! Cycles between relations are legal and are not reported; the evaluator
//! terminates them at check time.

use std::collections::{HashMap, HashSet};

use crate::model::{AuthorizationModel, RelationDefinition, RewriteExpr, TypeRestriction};

/// Validation error types
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Empty model (no type definitions)
    EmptyModel,
    /// The same type name is defined twice
    DuplicateType { type_name: String },
    /// The same relation name is defined twice on one type
    DuplicateRelation {
        type_name: String,
        relation_name: String,
    },
    /// A computed userset or tupleset names a relation missing from the type
    UndefinedRelation {
        type_name: String,
        relation_name: String,
        referenced_relation: String,
    },
    /// A type restriction names an undefined type or userset relation
    InvalidTypeRestriction {
        type_name: String,
        relation_name: String,
        restriction: String,
    },
    /// A tupleset relation has no direct object types to follow
    InvalidTupleset {
        type_name: String,
        relation_name: String,
        tupleset: String,
    },
    /// No type reachable through the tupleset defines the computed relation
    UndefinedComputedRelation {
        type_name: String,
        relation_name: String,
        tupleset: String,
        computed_relation: String,
    },
    /// A union or intersection with no operands
    EmptyOperands {
        type_name: String,
        relation_name: String,
    },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyModel => {
                write!(f, "model must have at least one type definition")
            }
            ValidationError::DuplicateType { type_name } => {
                write!(f, "duplicate type definition: {}", type_name)
            }
            ValidationError::DuplicateRelation {
                type_name,
                relation_name,
            } => write!(
                f,
                "duplicate relation '{}' in type '{}'",
                relation_name, type_name
            ),
            ValidationError::UndefinedRelation {
                type_name,
                relation_name,
                referenced_relation,
            } => write!(
                f,
                "undefined relation '{}' referenced in {}#{}",
                referenced_relation, type_name, relation_name
            ),
            ValidationError::InvalidTypeRestriction {
                type_name,
                relation_name,
                restriction,
            } => write!(
                f,
                "invalid type restriction '{}' in {}#{}",
                restriction, type_name, relation_name
            ),
            ValidationError::InvalidTupleset {
                type_name,
                relation_name,
                tupleset,
            } => write!(
                f,
                "tupleset '{}' in {}#{} has no directly related object types",
                tupleset, type_name, relation_name
            ),
            ValidationError::UndefinedComputedRelation {
                type_name,
                relation_name,
                tupleset,
                computed_relation,
            } => write!(
                f,
                "relation '{}' is not defined on any type related through '{}' in {}#{}",
                computed_relation, tupleset, type_name, relation_name
            ),
            ValidationError::EmptyOperands {
                type_name,
                relation_name,
            } => write!(
                f,
                "union or intersection without operands in {}#{}",
                type_name, relation_name
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, Vec<ValidationError>>;

/// Model validator
pub struct ModelValidator<'m> {
    model: &'m AuthorizationModel,
    /// Relations defined on each type: type_name -> relation_name -> definition
    type_relations: HashMap<&'m str, HashMap<&'m str, &'m RelationDefinition>>,
}

impl<'m> ModelValidator<'m> {
    /// Create a new validator for the given model
    pub fn new(model: &'m AuthorizationModel) -> Self {
        let mut type_relations: HashMap<&str, HashMap<&str, &RelationDefinition>> = HashMap::new();

        for type_def in &model.type_definitions {
            let relations = type_relations.entry(type_def.type_name.as_str()).or_default();
            for relation_def in &type_def.relations {
                relations.entry(relation_def.name.as_str()).or_insert(relation_def);
            }
        }

        Self {
            model,
            type_relations,
        }
    }

    /// Validate the model and return every error found
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if self.model.type_definitions.is_empty() {
            errors.push(ValidationError::EmptyModel);
            return Err(errors);
        }

        let mut seen_types = HashSet::new();
        for type_def in &self.model.type_definitions {
            if !seen_types.insert(type_def.type_name.as_str()) {
                errors.push(ValidationError::DuplicateType {
                    type_name: type_def.type_name.clone(),
                });
                continue;
            }

            let mut seen_relations = HashSet::new();
            for relation_def in &type_def.relations {
                if !seen_relations.insert(relation_def.name.as_str()) {
                    errors.push(ValidationError::DuplicateRelation {
                        type_name: type_def.type_name.clone(),
                        relation_name: relation_def.name.clone(),
                    });
                    continue;
                }

                self.validate_type_restrictions(&type_def.type_name, relation_def, &mut errors);
                self.validate_rewrite(
                    &type_def.type_name,
                    &relation_def.name,
                    &relation_def.rewrite,
                    &mut errors,
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn relation(&self, type_name: &str, relation: &str) -> Option<&'m RelationDefinition> {
        self.type_relations
            .get(type_name)
            .and_then(|relations| relations.get(relation))
            .copied()
    }

    fn validate_type_restrictions(
        &self,
        type_name: &str,
        relation_def: &RelationDefinition,
        errors: &mut Vec<ValidationError>,
    ) {
        for restriction in &relation_def.type_restrictions {
            let valid = match restriction {
                TypeRestriction::Direct { type_name: target }
                | TypeRestriction::Wildcard { type_name: target } => {
                    self.type_relations.contains_key(target.as_str())
                }
                TypeRestriction::Userset {
                    type_name: target,
                    relation,
                } => self.relation(target, relation).is_some(),
            };

            if !valid {
                errors.push(ValidationError::InvalidTypeRestriction {
                    type_name: type_name.to_string(),
                    relation_name: relation_def.name.clone(),
                    restriction: restriction.to_string(),
                });
            }
        }
    }

    fn validate_rewrite(
        &self,
        type_name: &str,
        relation_name: &str,
        rewrite: &RewriteExpr,
        errors: &mut Vec<ValidationError>,
    ) {
        match rewrite {
            RewriteExpr::This => {}
            RewriteExpr::ComputedUserset { relation } => {
                if self.relation(type_name, relation).is_none() {
                    errors.push(ValidationError::UndefinedRelation {
                        type_name: type_name.to_string(),
                        relation_name: relation_name.to_string(),
                        referenced_relation: relation.clone(),
                    });
                }
            }
            RewriteExpr::TupleToUserset {
                tupleset,
                computed_userset,
            } => {
                self.validate_tuple_to_userset(
                    type_name,
                    relation_name,
                    tupleset,
                    computed_userset,
                    errors,
                );
            }
            RewriteExpr::Union { children } | RewriteExpr::Intersection { children } => {
                if children.is_empty() {
                    errors.push(ValidationError::EmptyOperands {
                        type_name: type_name.to_string(),
                        relation_name: relation_name.to_string(),
                    });
                }
                for child in children {
                    self.validate_rewrite(type_name, relation_name, child, errors);
                }
            }
            RewriteExpr::Exclusion { base, subtract } => {
                self.validate_rewrite(type_name, relation_name, base, errors);
                self.validate_rewrite(type_name, relation_name, subtract, errors);
            }
        }
    }

    fn validate_tuple_to_userset(
        &self,
        type_name: &str,
        relation_name: &str,
        tupleset: &str,
        computed_userset: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        let Some(tupleset_def) = self.relation(type_name, tupleset) else {
            errors.push(ValidationError::UndefinedRelation {
                type_name: type_name.to_string(),
                relation_name: relation_name.to_string(),
                referenced_relation: tupleset.to_string(),
            });
            return;
        };

        // Unrestricted tuplesets may link to any type.
        let parent_types: Vec<&str> = if tupleset_def.type_restrictions.is_empty() {
            self.type_relations.keys().copied().collect()
        } else {
            tupleset_def.direct_types().collect()
        };

        if parent_types.is_empty() {
            errors.push(ValidationError::InvalidTupleset {
                type_name: type_name.to_string(),
                relation_name: relation_name.to_string(),
                tupleset: tupleset.to_string(),
            });
            return;
        }

        let defined_somewhere = parent_types
            .iter()
            .any(|parent| self.relation(parent, computed_userset).is_some());
        if !defined_somewhere {
            errors.push(ValidationError::UndefinedComputedRelation {
                type_name: type_name.to_string(),
                relation_name: relation_name.to_string(),
                tupleset: tupleset.to_string(),
                computed_relation: computed_userset.to_string(),
            });
        }
    }
}

/// Validate a model, collecting every error.
pub fn validate_model(model: &AuthorizationModel) -> ValidationResult<()> {
    ModelValidator::new(model).validate()
}
