//! DSL parser for authorization models.
//!
//! Parses the model DSL into AuthorizationModel structures.
//!
//! Example DSL:
//! ```text
//! model
//!   schema 1.1
//!
//! type user
//!
//! type group
//!   relations
//!     define member: [user, group#member]
//!
//! type server
//!   relations
//!     define admin: [user, group#member]
//!     define user: [user:*]
//!     define can_view_server: user or admin
//! ```

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace1, satisfy, space0, space1},
    combinator::{all_consuming, map, not, opt, success, value},
    error::{context, ContextError, ParseError},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use super::{AuthorizationModel, RelationDefinition, RewriteExpr, TypeDefinition, TypeRestriction};
use crate::error::DomainError;

/// Parser error type with context for better error messages.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserError {
    pub message: String,
    pub position: Option<usize>,
}

impl ParserError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
        }
    }

    pub fn with_position(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position: Some(position),
        }
    }
}

impl std::fmt::Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(pos) = self.position {
            write!(f, "{} at position {}", self.message, pos)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ParserError {}

impl From<ParserError> for DomainError {
    fn from(err: ParserError) -> Self {
        DomainError::ModelParseError {
            message: err.to_string(),
        }
    }
}

/// Result type for parser operations.
pub type ParserResult<T> = Result<T, ParserError>;

// ============ Helper Parsers ============

/// Parse a comment (# to end of line)
fn comment<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, (), E> {
    value((), pair(char('#'), take_while(|c| c != '\n' && c != '\r')))(input)
}

/// Parse whitespace including comments
fn ws<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, (), E> {
    value((), many0(alt((value((), multispace1), comment))))(input)
}

/// Reserved keywords that cannot be used as identifiers
const RESERVED_KEYWORDS: &[&str] = &[
    "type",
    "relations",
    "define",
    "or",
    "and",
    "but",
    "not",
    "from",
    "this",
];

fn is_reserved(s: &str) -> bool {
    RESERVED_KEYWORDS.contains(&s)
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parse an identifier (alphanumeric and underscore, not a reserved keyword)
fn identifier<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    let (rest, id) = take_while1(is_identifier_char)(input)?;

    if is_reserved(id) {
        return Err(nom::Err::Error(E::from_error_kind(
            input,
            nom::error::ErrorKind::Tag,
        )));
    }

    Ok((rest, id))
}

/// Match a keyword only when it is not the prefix of a longer identifier.
fn keyword<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    word: &'static str,
) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str, E> {
    terminated(tag(word), not(satisfy(is_identifier_char)))
}

// ============ Header Parser ============

/// Parse the optional "model / schema 1.1" header, returning the schema version.
fn model_header<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    context(
        "model header",
        preceded(
            tuple((keyword("model"), ws, keyword("schema"), space1)),
            take_while1(|c: char| c.is_ascii_digit() || c == '.'),
        ),
    )(input)
}

// ============ Type Restriction Parsers ============

/// Parse one restriction entry: `user`, `user:*` or `group#member`
fn type_restriction<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, TypeRestriction, E> {
    let (rest, type_name) = identifier(input)?;
    alt((
        map(tag(":*"), |_| TypeRestriction::Wildcard {
            type_name: type_name.to_string(),
        }),
        map(preceded(char('#'), identifier), |relation: &str| {
            TypeRestriction::Userset {
                type_name: type_name.to_string(),
                relation: relation.to_string(),
            }
        }),
        map(success(()), |_| TypeRestriction::Direct {
            type_name: type_name.to_string(),
        }),
    ))(rest)
}

/// Parse a restriction list like [user] or [user, user:*, group#member]
fn type_restrictions<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Vec<TypeRestriction>, E> {
    context(
        "type restrictions",
        delimited(
            pair(char('['), space0),
            separated_list1(tuple((space0, char(','), space0)), type_restriction),
            pair(space0, char(']')),
        ),
    )(input)
}

// ============ Rewrite Parsers ============

/// Parse "this" keyword to RewriteExpr::This
fn parse_this<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, RewriteExpr, E> {
    value(RewriteExpr::This, keyword("this"))(input)
}

/// Parse a direct relation reference (just a relation name)
fn parse_computed_userset<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, RewriteExpr, E> {
    map(identifier, RewriteExpr::computed)(input)
}

/// Parse "relation from tupleset" (tuple to userset)
fn parse_tuple_to_userset<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, RewriteExpr, E> {
    context(
        "tuple to userset",
        map(
            tuple((identifier, space1, keyword("from"), space1, identifier)),
            |(computed, _, _, _, tupleset): (&str, _, _, _, &str)| {
                RewriteExpr::tuple_to_userset(tupleset, computed)
            },
        ),
    )(input)
}

/// Parse a parenthesized sub-expression
fn parse_group<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, RewriteExpr, E> {
    context(
        "parenthesized expression",
        delimited(
            pair(char('('), space0),
            parse_rewrite,
            pair(space0, char(')')),
        ),
    )(input)
}

/// Parse a base expression (group, this, computed, or tuple_to_userset)
fn parse_base<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, RewriteExpr, E> {
    alt((
        parse_group,
        parse_this,
        parse_tuple_to_userset,
        parse_computed_userset,
    ))(input)
}

fn but_not<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, (), E> {
    value(
        (),
        tuple((space1, keyword("but"), space1, keyword("not"), space1)),
    )(input)
}

/// Parse "base but not subtract" (highest precedence after base)
fn parse_exclusion_or_base<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, RewriteExpr, E> {
    let (rest, base) = parse_base(input)?;
    match preceded(but_not::<E>, parse_base::<E>)(rest) {
        Ok((rest, subtract)) => Ok((rest, RewriteExpr::exclusion(base, subtract))),
        Err(nom::Err::Error(_)) => Ok((rest, base)),
        Err(e) => Err(e),
    }
}

fn and_operator<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, (), E> {
    value((), tuple((space0, keyword("and"), space1)))(input)
}

fn or_operator<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, (), E> {
    value((), tuple((space0, keyword("or"), space1)))(input)
}

/// Parse intersection level (and binds tighter than or)
fn parse_intersection_level<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, RewriteExpr, E> {
    let (rest, first) = parse_exclusion_or_base(input)?;
    let (rest, and_operands) = many0(preceded(and_operator, parse_exclusion_or_base))(rest)?;

    if and_operands.is_empty() {
        Ok((rest, first))
    } else {
        let mut children = vec![first];
        children.extend(and_operands);
        Ok((rest, RewriteExpr::Intersection { children }))
    }
}

/// Parse union level (lowest precedence)
fn parse_union_level<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, RewriteExpr, E> {
    let (rest, first) = parse_intersection_level(input)?;
    let (rest, or_operands) = many0(preceded(or_operator, parse_intersection_level))(rest)?;

    if or_operands.is_empty() {
        Ok((rest, first))
    } else {
        let mut children = vec![first];
        children.extend(or_operands);
        Ok((rest, RewriteExpr::Union { children }))
    }
}

/// Parse a complete rewrite expression with proper operator precedence.
/// Precedence (highest to lowest): exclusion (but not), intersection (and), union (or)
fn parse_rewrite<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, RewriteExpr, E> {
    parse_union_level(input)
}

/// Operands following a restriction list, tagged with the operator that joined them.
#[derive(Debug, Clone)]
enum Continuation {
    None,
    Or(Vec<RewriteExpr>),
    And(Vec<RewriteExpr>),
    ButNot(RewriteExpr),
}

/// Parse or/and/but-not operands after a restriction list (e.g. "[user] or owner").
fn parse_continuation<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Continuation, E> {
    let (rest, or_ops) = many0(preceded(or_operator, parse_intersection_level))(input)?;
    if !or_ops.is_empty() {
        return Ok((rest, Continuation::Or(or_ops)));
    }

    let (rest, and_ops) = many0(preceded(and_operator, parse_exclusion_or_base))(input)?;
    if !and_ops.is_empty() {
        return Ok((rest, Continuation::And(and_ops)));
    }

    if let Ok((rest, subtract)) = preceded(but_not::<E>, parse_base::<E>)(input) {
        return Ok((rest, Continuation::ButNot(subtract)));
    }

    Ok((input, Continuation::None))
}

// ============ Relation Definition Parser ============

/// Parse a relation definition like "define viewer: [user] or editor"
fn parse_relation_definition<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, RelationDefinition, E> {
    context(
        "relation definition",
        map(
            tuple((
                space0,
                keyword("define"),
                space1,
                identifier,
                space0,
                char(':'),
                space0,
                opt(type_restrictions),
                opt(preceded(space0, parse_rewrite)),
                parse_continuation,
            )),
            |(_, _, _, name, _, _, _, restrictions, explicit, continuation): (
                _,
                _,
                _,
                &str,
                _,
                _,
                _,
                Option<Vec<TypeRestriction>>,
                Option<RewriteExpr>,
                Continuation,
            )| {
                // A bare restriction list means direct assignment.
                let base = explicit.unwrap_or(RewriteExpr::This);

                let rewrite = match continuation {
                    Continuation::None => base,
                    Continuation::Or(operands) => {
                        let mut children = vec![base];
                        children.extend(operands);
                        RewriteExpr::Union { children }
                    }
                    Continuation::And(operands) => {
                        let mut children = vec![base];
                        children.extend(operands);
                        RewriteExpr::Intersection { children }
                    }
                    Continuation::ButNot(subtract) => RewriteExpr::exclusion(base, subtract),
                };

                RelationDefinition {
                    name: name.to_string(),
                    type_restrictions: restrictions.unwrap_or_default(),
                    rewrite,
                }
            },
        ),
    )(input)
}

// ============ Type Definition Parser ============

/// Parse a type definition with optional relations
fn parse_type_definition<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, TypeDefinition, E> {
    context(
        "type definition",
        map(
            tuple((
                keyword("type"),
                space1,
                identifier,
                ws,
                opt(preceded(
                    tuple((keyword("relations"), ws)),
                    many0(terminated(parse_relation_definition, ws)),
                )),
            )),
            |(_, _, type_name, _, relations): (_, _, &str, _, _)| {
                TypeDefinition::new(type_name, relations.unwrap_or_default())
            },
        ),
    )(input)
}

// ============ Model Parser ============

fn parse_model<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, AuthorizationModel, E> {
    context(
        "authorization model",
        map(
            tuple((
                ws,
                opt(terminated(model_header, ws)),
                many0(terminated(parse_type_definition, ws)),
            )),
            |(_, schema_version, type_definitions)| AuthorizationModel {
                schema_version: schema_version
                    .unwrap_or(AuthorizationModel::DEFAULT_SCHEMA_VERSION)
                    .to_string(),
                type_definitions,
            },
        ),
    )(input)
}

// ============ Public API ============

/// Parse a DSL string into an AuthorizationModel.
///
/// The result is not validated; pass it to
/// [`TypeSystem::compile`](crate::model::TypeSystem::compile) before use.
pub fn parse(input: &str) -> ParserResult<AuthorizationModel> {
    match all_consuming(parse_model::<nom::error::VerboseError<&str>>)(input) {
        Ok((_, model)) => Ok(model),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let position = e
                .errors
                .first()
                .map(|(remaining, _)| input.len() - remaining.len());
            let message = format!("Parse error: {}", nom::error::convert_error(input, e));
            Err(match position {
                Some(position) => ParserError::with_position(message, position),
                None => ParserError::new(message),
            })
        }
        Err(nom::Err::Incomplete(_)) => Err(ParserError::new("Incomplete input")),
    }
}
