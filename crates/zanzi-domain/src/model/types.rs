//! Core type definitions for the authorization model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Returns true if `value` is usable as a type name.
pub(crate) fn is_valid_type_name(value: &str) -> bool {
    !value.is_empty()
        && !value
            .chars()
            .any(|c| c == ':' || c == '#' || c == '*' || c.is_whitespace())
}

/// Returns true if `value` is usable as an object id.
pub(crate) fn is_valid_object_id(value: &str) -> bool {
    !value.is_empty() && value != "*" && !value.chars().any(|c| c == '#' || c.is_whitespace())
}

/// Returns true if `value` is usable as a relation name.
pub(crate) fn is_valid_relation_name(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Validates a relation name, returning it unchanged.
pub fn parse_relation(value: &str) -> DomainResult<&str> {
    if is_valid_relation_name(value) {
        Ok(value)
    } else {
        Err(DomainError::InvalidRelationFormat {
            value: value.to_string(),
        })
    }
}

/// An object identifier (e.g., "server:lxd").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectRef {
    /// The type portion (e.g., "server").
    pub object_type: String,
    /// The ID portion (e.g., "lxd").
    pub object_id: String,
}

impl ObjectRef {
    /// Creates a new ObjectRef from type and ID without validation.
    pub fn new(object_type: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            object_id: object_id.into(),
        }
    }

    /// Parses an object from "type:id" format.
    ///
    /// The id may itself contain ':'; only the first separator is significant.
    pub fn parse(value: &str) -> DomainResult<Self> {
        let invalid = || DomainError::InvalidObjectFormat {
            value: value.to_string(),
        };
        let (object_type, object_id) = value.split_once(':').ok_or_else(invalid)?;
        if !is_valid_type_name(object_type) || !is_valid_object_id(object_id) {
            return Err(invalid());
        }
        Ok(Self::new(object_type, object_id))
    }
}

impl FromStr for ObjectRef {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ObjectRef {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ObjectRef> for String {
    fn from(value: ObjectRef) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_type, self.object_id)
    }
}

/// The subject of a tuple or check.
///
/// String forms:
/// - `user:alice` is a [`UserRef::Direct`] principal
/// - `user:*` is a [`UserRef::Wildcard`] meaning every user of that type
/// - `group:admins#member` is a [`UserRef::Userset`], resolved by a nested check
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum UserRef {
    /// A concrete principal.
    Direct(ObjectRef),
    /// Any user of the named type.
    Wildcard(String),
    /// Every user satisfying `relation` on `object`.
    Userset { object: ObjectRef, relation: String },
}

impl UserRef {
    /// Creates a direct user reference.
    pub fn direct(user_type: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self::Direct(ObjectRef::new(user_type, user_id))
    }

    /// Creates a wildcard reference for a type.
    pub fn wildcard(user_type: impl Into<String>) -> Self {
        Self::Wildcard(user_type.into())
    }

    /// Creates a userset reference.
    pub fn userset(object: ObjectRef, relation: impl Into<String>) -> Self {
        Self::Userset {
            object,
            relation: relation.into(),
        }
    }

    /// Parses a user from its string form.
    pub fn parse(value: &str) -> DomainResult<Self> {
        let invalid = || DomainError::InvalidUserFormat {
            value: value.to_string(),
        };

        if let Some((object, relation)) = value.split_once('#') {
            let object = ObjectRef::parse(object).map_err(|_| invalid())?;
            if !is_valid_relation_name(relation) {
                return Err(invalid());
            }
            return Ok(Self::userset(object, relation));
        }

        let (user_type, user_id) = value.split_once(':').ok_or_else(invalid)?;
        if !is_valid_type_name(user_type) {
            return Err(invalid());
        }
        if user_id == "*" {
            return Ok(Self::wildcard(user_type));
        }
        if !is_valid_object_id(user_id) {
            return Err(invalid());
        }
        Ok(Self::direct(user_type, user_id))
    }

    /// The type of the user, or of the userset's object.
    pub fn user_type(&self) -> &str {
        match self {
            Self::Direct(object) => &object.object_type,
            Self::Wildcard(user_type) => user_type,
            Self::Userset { object, .. } => &object.object_type,
        }
    }

    /// Returns true for `type:*` references.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard(_))
    }

    /// Returns true for `type:id#relation` references.
    pub fn is_userset(&self) -> bool {
        matches!(self, Self::Userset { .. })
    }
}

impl FromStr for UserRef {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for UserRef {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<UserRef> for String {
    fn from(value: UserRef) -> Self {
        value.to_string()
    }
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(object) => write!(f, "{object}"),
            Self::Wildcard(user_type) => write!(f, "{user_type}:*"),
            Self::Userset { object, relation } => write!(f, "{object}#{relation}"),
        }
    }
}

/// A tuple representing a relationship (user, relation, object).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tuple {
    /// The user (subject) of the relationship.
    pub user: UserRef,
    /// The relation between user and object.
    pub relation: String,
    /// The object of the relationship.
    pub object: ObjectRef,
}

impl Tuple {
    /// Creates a new Tuple from already parsed parts.
    pub fn new(user: UserRef, relation: impl Into<String>, object: ObjectRef) -> Self {
        Self {
            user,
            relation: relation.into(),
            object,
        }
    }

    /// Parses a tuple from its three string parts.
    pub fn parse(user: &str, relation: &str, object: &str) -> DomainResult<Self> {
        Ok(Self::new(
            UserRef::parse(user)?,
            parse_relation(relation)?,
            ObjectRef::parse(object)?,
        ))
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.object, self.relation, self.user)
    }
}

/// A user type a relation accepts directly, written inside `[...]` in the DSL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeRestriction {
    /// `user`: direct users of the type.
    Direct { type_name: String },
    /// `user:*`: the wildcard of the type.
    Wildcard { type_name: String },
    /// `group#member`: usersets of the type and relation.
    Userset { type_name: String, relation: String },
}

impl TypeRestriction {
    /// The referenced type name.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Direct { type_name }
            | Self::Wildcard { type_name }
            | Self::Userset { type_name, .. } => type_name,
        }
    }

    /// Parses `type`, `type:*` or `type#relation`.
    pub fn parse(value: &str) -> DomainResult<Self> {
        let invalid = || DomainError::ModelParseError {
            message: format!("invalid type restriction: '{value}'"),
        };
        if let Some((type_name, relation)) = value.split_once('#') {
            if !is_valid_type_name(type_name) || !is_valid_relation_name(relation) {
                return Err(invalid());
            }
            return Ok(Self::Userset {
                type_name: type_name.to_string(),
                relation: relation.to_string(),
            });
        }
        if let Some(type_name) = value.strip_suffix(":*") {
            if !is_valid_type_name(type_name) {
                return Err(invalid());
            }
            return Ok(Self::Wildcard {
                type_name: type_name.to_string(),
            });
        }
        if !is_valid_type_name(value) {
            return Err(invalid());
        }
        Ok(Self::Direct {
            type_name: value.to_string(),
        })
    }
}

impl TryFrom<String> for TypeRestriction {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TypeRestriction> for String {
    fn from(value: TypeRestriction) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TypeRestriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct { type_name } => write!(f, "{type_name}"),
            Self::Wildcard { type_name } => write!(f, "{type_name}:*"),
            Self::Userset {
                type_name,
                relation,
            } => write!(f, "{type_name}#{relation}"),
        }
    }
}

/// An authorization model defining types and their relations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationModel {
    /// Schema version (e.g., "1.1").
    pub schema_version: String,
    /// Type definitions in the model.
    pub type_definitions: Vec<TypeDefinition>,
}

impl AuthorizationModel {
    /// Default schema version for models built in code.
    pub const DEFAULT_SCHEMA_VERSION: &'static str = "1.1";

    /// Creates a model with the default schema version.
    pub fn with_types(type_definitions: Vec<TypeDefinition>) -> Self {
        Self {
            schema_version: Self::DEFAULT_SCHEMA_VERSION.to_string(),
            type_definitions,
        }
    }
}

/// A type definition within the authorization model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinition {
    /// The type name (e.g., "server", "project").
    pub type_name: String,
    /// Relations defined on this type.
    #[serde(default)]
    pub relations: Vec<RelationDefinition>,
}

impl TypeDefinition {
    /// Creates a type definition.
    pub fn new(type_name: impl Into<String>, relations: Vec<RelationDefinition>) -> Self {
        Self {
            type_name: type_name.into(),
            relations,
        }
    }
}

/// A relation definition on a type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDefinition {
    /// The relation name.
    pub name: String,
    /// User types accepted on direct tuples. Empty means unrestricted.
    #[serde(default)]
    pub type_restrictions: Vec<TypeRestriction>,
    /// The rewrite expression for this relation.
    pub rewrite: RewriteExpr,
}

impl RelationDefinition {
    /// Creates an unrestricted relation definition.
    pub fn new(name: impl Into<String>, rewrite: RewriteExpr) -> Self {
        Self {
            name: name.into(),
            type_restrictions: Vec::new(),
            rewrite,
        }
    }

    /// Sets the directly related user types.
    pub fn with_restrictions(mut self, type_restrictions: Vec<TypeRestriction>) -> Self {
        self.type_restrictions = type_restrictions;
        self
    }

    /// Returns true if a tuple carrying `user` may be stored against this relation.
    ///
    /// Wildcards need an explicit `type:*` restriction even when the relation
    /// is otherwise unrestricted.
    pub fn permits(&self, user: &UserRef) -> bool {
        match user {
            UserRef::Wildcard(user_type) => self.accepts_wildcard(user_type),
            _ if self.type_restrictions.is_empty() => true,
            UserRef::Direct(object) => self.type_restrictions.iter().any(|r| {
                matches!(r, TypeRestriction::Direct { type_name } if *type_name == object.object_type)
            }),
            UserRef::Userset { object, relation } => {
                self.permits_userset(&object.object_type, relation)
            }
        }
    }

    /// Returns true if `type_name:<id>#relation` usersets are accepted.
    pub fn permits_userset(&self, type_name: &str, relation: &str) -> bool {
        self.type_restrictions.is_empty()
            || self.type_restrictions.iter().any(|r| {
                matches!(
                    r,
                    TypeRestriction::Userset { type_name: t, relation: rel }
                        if t == type_name && rel == relation
                )
            })
    }

    /// Returns true if `user_type:*` tuples are honored for this relation.
    pub fn accepts_wildcard(&self, user_type: &str) -> bool {
        self.type_restrictions.iter().any(
            |r| matches!(r, TypeRestriction::Wildcard { type_name } if type_name == user_type),
        )
    }

    /// Types that may appear as direct (non-userset, non-wildcard) users.
    pub fn direct_types(&self) -> impl Iterator<Item = &str> {
        self.type_restrictions.iter().filter_map(|r| match r {
            TypeRestriction::Direct { type_name } => Some(type_name.as_str()),
            _ => None,
        })
    }
}

/// A rewrite expression defines how membership in a relation is computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteExpr {
    /// Direct assignment (this).
    This,
    /// Computed userset from another relation on the same object.
    ComputedUserset { relation: String },
    /// Tuple to userset (relation from parent).
    TupleToUserset {
        tupleset: String,
        computed_userset: String,
    },
    /// Union of multiple expressions.
    Union { children: Vec<RewriteExpr> },
    /// Intersection of multiple expressions.
    Intersection { children: Vec<RewriteExpr> },
    /// Exclusion (base but not subtract).
    Exclusion {
        base: Box<RewriteExpr>,
        subtract: Box<RewriteExpr>,
    },
}

impl RewriteExpr {
    /// `relation` on the same object.
    pub fn computed(relation: impl Into<String>) -> Self {
        Self::ComputedUserset {
            relation: relation.into(),
        }
    }

    /// `computed_userset from tupleset`.
    pub fn tuple_to_userset(tupleset: impl Into<String>, computed_userset: impl Into<String>) -> Self {
        Self::TupleToUserset {
            tupleset: tupleset.into(),
            computed_userset: computed_userset.into(),
        }
    }

    /// `base but not subtract`.
    pub fn exclusion(base: RewriteExpr, subtract: RewriteExpr) -> Self {
        Self::Exclusion {
            base: Box::new(base),
            subtract: Box::new(subtract),
        }
    }
}
