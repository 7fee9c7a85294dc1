//! Request and response types for checks.

use serde::{Deserialize, Serialize};

use crate::error::DomainResult;
use crate::model::{parse_relation, ObjectRef, UserRef};

/// Request for a permission check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckRequest {
    /// The user being checked.
    pub user: UserRef,
    /// The relation to check (e.g., "can_view").
    pub relation: String,
    /// The object the relation is checked on.
    pub object: ObjectRef,
}

impl CheckRequest {
    /// Creates a new CheckRequest from parsed parts.
    pub fn new(user: UserRef, relation: impl Into<String>, object: ObjectRef) -> Self {
        Self {
            user,
            relation: relation.into(),
            object,
        }
    }

    /// Parses a request from the string query surface.
    pub fn parse(user: &str, relation: &str, object: &str) -> DomainResult<Self> {
        Ok(Self::new(
            UserRef::parse(user)?,
            parse_relation(relation)?,
            ObjectRef::parse(object)?,
        ))
    }
}

/// Result of a permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Whether the user holds the relation.
    pub allowed: bool,
}
