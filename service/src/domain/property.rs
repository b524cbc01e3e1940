//! Property definitions.
//!
//! Properties themselves are managed outside of this service and are
//! referenced by their [`Id`] only.

use std::collections::HashSet;

use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ID of a property.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Set of properties a user is allowed to operate on.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Access {
    /// Every property is allowed.
    #[default]
    Any,

    /// Only the listed properties are allowed.
    Only(HashSet<Id>),
}

impl Access {
    /// Checks whether the property with the provided [`Id`] is allowed.
    #[must_use]
    pub fn allows(&self, id: Id) -> bool {
        match self {
            Self::Any => true,
            Self::Only(ids) => ids.contains(&id),
        }
    }
}

impl FromIterator<Id> for Access {
    /// Collects an [`Access`] from the allowed property IDs.
    ///
    /// No IDs at all means no restrictions, so [`Access::Any`] is returned.
    fn from_iter<I: IntoIterator<Item = Id>>(iter: I) -> Self {
        let ids = iter.into_iter().collect::<HashSet<_>>();
        if ids.is_empty() {
            Self::Any
        } else {
            Self::Only(ids)
        }
    }
}

#[cfg(test)]
mod spec {
    use super::{Access, Id};

    #[test]
    fn empty_list_allows_everything() {
        let access = Vec::<Id>::new().into_iter().collect::<Access>();

        assert_eq!(access, Access::Any);
        assert!(access.allows(Id::new()));
    }

    #[test]
    fn listed_properties_only() {
        let (allowed, other) = (Id::new(), Id::new());
        let access = [allowed].into_iter().collect::<Access>();

        assert!(access.allows(allowed));
        assert!(!access.allows(other));
    }
}
