//! Userset expansion: the tuples stored against one object relation,
//! classified by how a check has to use them.

use crate::error::DomainResult;
use crate::model::{ObjectRef, Tuple, UserRef};

use super::traits::TupleReader;

/// One stored subject of an `(object, relation)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandedEntry<'a> {
    /// A concrete user; matches by identity.
    Direct(&'a ObjectRef),
    /// `type:*`; matches any direct user of that type.
    Wildcard(&'a str),
    /// `type:id#relation`; matches through a nested check.
    Userset {
        object: &'a ObjectRef,
        relation: &'a str,
    },
}

impl<'a> ExpandedEntry<'a> {
    fn from_user(user: &'a UserRef) -> Self {
        match user {
            UserRef::Direct(object) => Self::Direct(object),
            UserRef::Wildcard(user_type) => Self::Wildcard(user_type),
            UserRef::Userset { object, relation } => Self::Userset { object, relation },
        }
    }

    /// Returns true if this entry is literally `user`.
    pub fn is_literally(&self, user: &UserRef) -> bool {
        *self == ExpandedEntry::from_user(user)
    }
}

/// Tuples returned by [`expand`]; iterate as many times as needed.
#[derive(Debug, Clone, Default)]
pub struct Expansion {
    tuples: Vec<Tuple>,
}

impl Expansion {
    /// Classified entries, produced lazily from the fetched tuples.
    pub fn iter(&self) -> impl Iterator<Item = ExpandedEntry<'_>> + '_ {
        self.tuples.iter().map(|t| ExpandedEntry::from_user(&t.user))
    }

    /// Objects of direct entries, e.g. the parents a tupleset links to.
    pub fn direct_objects(&self) -> impl Iterator<Item = &ObjectRef> + '_ {
        self.iter().filter_map(|entry| match entry {
            ExpandedEntry::Direct(object) => Some(object),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }
}

/// Fetches every tuple stored against `relation` on `object`.
///
/// Tuples the store returns for a different key are dropped.
pub async fn expand<R>(reader: &R, relation: &str, object: &ObjectRef) -> DomainResult<Expansion>
where
    R: TupleReader + ?Sized,
{
    let mut tuples = reader.list_tuples(relation, object).await?;
    tuples.retain(|t| t.relation == relation && t.object == *object);
    Ok(Expansion { tuples })
}
