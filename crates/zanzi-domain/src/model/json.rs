//! JSON authoring format for authorization models.
//!
//! Accepts the widely used `schema_version` / `type_definitions` layout:
//!
//! ```json
//! {
//!   "schema_version": "1.1",
//!   "type_definitions": [
//!     { "type": "user" },
//!     {
//!       "type": "server",
//!       "relations": {
//!         "admin": { "this": {} },
//!         "can_edit_server": { "computedUserset": { "relation": "admin" } }
//!       },
//!       "metadata": {
//!         "relations": {
//!           "admin": { "directly_related_user_types": [{ "type": "user" }] }
//!         }
//!       }
//!     }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::error::{DomainError, DomainResult};

use super::types::{
    AuthorizationModel, RelationDefinition, RewriteExpr, TypeDefinition, TypeRestriction,
};

#[derive(Debug, Deserialize)]
struct JsonModel {
    #[serde(default = "default_schema_version")]
    schema_version: String,
    #[serde(default)]
    type_definitions: Vec<JsonTypeDefinition>,
}

fn default_schema_version() -> String {
    AuthorizationModel::DEFAULT_SCHEMA_VERSION.to_string()
}

#[derive(Debug, Deserialize)]
struct JsonTypeDefinition {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default, deserialize_with = "ordered_entries")]
    relations: Vec<(String, JsonUserset)>,
    #[serde(default)]
    metadata: Option<JsonTypeMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct JsonTypeMetadata {
    #[serde(default)]
    relations: BTreeMap<String, JsonRelationMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct JsonRelationMetadata {
    #[serde(default)]
    directly_related_user_types: Vec<JsonRelationReference>,
}

#[derive(Debug, Clone, Deserialize)]
struct JsonRelationReference {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    relation: Option<String>,
    #[serde(default)]
    wildcard: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonUserset {
    #[serde(default)]
    this: Option<serde_json::Value>,
    #[serde(default)]
    computed_userset: Option<JsonObjectRelation>,
    #[serde(default)]
    tuple_to_userset: Option<JsonTupleToUserset>,
    #[serde(default)]
    union: Option<JsonUsersets>,
    #[serde(default)]
    intersection: Option<JsonUsersets>,
    #[serde(default)]
    difference: Option<JsonDifference>,
}

#[derive(Debug, Deserialize)]
struct JsonObjectRelation {
    #[serde(default)]
    relation: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonTupleToUserset {
    tupleset: JsonObjectRelation,
    computed_userset: JsonObjectRelation,
}

#[derive(Debug, Deserialize)]
struct JsonUsersets {
    #[serde(default)]
    child: Vec<JsonUserset>,
}

#[derive(Debug, Deserialize)]
struct JsonDifference {
    base: Box<JsonUserset>,
    subtract: Box<JsonUserset>,
}

/// Reads a JSON object as its entries in document order, keeping repeated keys
/// so that the validator can report them.
fn ordered_entries<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct EntriesVisitor<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
        type Value = Vec<(String, V)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of relation names to usersets")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(EntriesVisitor(PhantomData))
}

fn parse_error(message: impl Into<String>) -> DomainError {
    DomainError::ModelParseError {
        message: message.into(),
    }
}

impl JsonUserset {
    fn into_rewrite(self, context: &str) -> DomainResult<RewriteExpr> {
        let JsonUserset {
            this,
            computed_userset,
            tuple_to_userset,
            union,
            intersection,
            difference,
        } = self;

        let mut rewrites = Vec::with_capacity(1);
        if this.is_some() {
            rewrites.push(RewriteExpr::This);
        }
        if let Some(computed) = computed_userset {
            rewrites.push(RewriteExpr::computed(computed.relation));
        }
        if let Some(ttu) = tuple_to_userset {
            rewrites.push(RewriteExpr::tuple_to_userset(
                ttu.tupleset.relation,
                ttu.computed_userset.relation,
            ));
        }
        if let Some(union) = union {
            rewrites.push(RewriteExpr::Union {
                children: convert_children(union.child, context)?,
            });
        }
        if let Some(intersection) = intersection {
            rewrites.push(RewriteExpr::Intersection {
                children: convert_children(intersection.child, context)?,
            });
        }
        if let Some(difference) = difference {
            rewrites.push(RewriteExpr::exclusion(
                difference.base.into_rewrite(context)?,
                difference.subtract.into_rewrite(context)?,
            ));
        }

        match rewrites.len() {
            1 => Ok(rewrites.remove(0)),
            0 => Err(parse_error(format!("{context}: empty userset"))),
            _ => Err(parse_error(format!(
                "{context}: userset must have exactly one operator"
            ))),
        }
    }
}

fn convert_children(children: Vec<JsonUserset>, context: &str) -> DomainResult<Vec<RewriteExpr>> {
    children
        .into_iter()
        .map(|child| child.into_rewrite(context))
        .collect()
}

impl JsonRelationReference {
    fn into_restriction(self) -> TypeRestriction {
        match (self.relation, self.wildcard) {
            (Some(relation), _) if !relation.is_empty() => TypeRestriction::Userset {
                type_name: self.type_name,
                relation,
            },
            (_, Some(_)) => TypeRestriction::Wildcard {
                type_name: self.type_name,
            },
            _ => TypeRestriction::Direct {
                type_name: self.type_name,
            },
        }
    }
}

/// Parses a JSON model document. The result is not validated.
pub fn parse_json(input: &str) -> DomainResult<AuthorizationModel> {
    let model: JsonModel = serde_json::from_str(input)
        .map_err(|e| parse_error(format!("invalid model JSON: {e}")))?;

    let type_definitions = model
        .type_definitions
        .into_iter()
        .map(|type_def| {
            let metadata = type_def.metadata.unwrap_or_default().relations;
            let relations = type_def
                .relations
                .into_iter()
                .map(|(name, userset)| {
                    let context = format!("{}#{}", type_def.type_name, name);
                    let rewrite = userset.into_rewrite(&context)?;
                    let type_restrictions = metadata
                        .get(&name)
                        .cloned()
                        .unwrap_or_default()
                        .directly_related_user_types
                        .into_iter()
                        .map(JsonRelationReference::into_restriction)
                        .collect();
                    Ok(RelationDefinition::new(name, rewrite).with_restrictions(type_restrictions))
                })
                .collect::<DomainResult<Vec<_>>>()?;
            Ok(TypeDefinition::new(type_def.type_name, relations))
        })
        .collect::<DomainResult<Vec<_>>>()?;

    Ok(AuthorizationModel {
        schema_version: model.schema_version,
        type_definitions,
    })
}
