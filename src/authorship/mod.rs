//! Authorship comparison
//!
//! The names index only needs a yes/no/unknown answer when comparing the
//! authorship of a query with a candidate. The comparator is injected into the
//! index as a trait object, [`BasicAuthorComparator`] is the default.

mod author;
mod comparator;
mod parser;

pub use author::{normalize_team, Author};
pub use comparator::{compare_years, BasicAuthorComparator};
pub use parser::{parse_authorship, ParsedAuthorship};

use crate::model::ScientificName;

/// Three valued outcome of an authorship comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Equality {
    Equal,
    Different,
    Unknown,
}

impl Equality {
    /// Combines two partial comparisons.
    ///
    /// UNKNOWN yields to the other side, a conflict yields DIFFERENT.
    pub fn and(self, other: Equality) -> Equality {
        if self == other {
            return self;
        }
        match (self, other) {
            (Equality::Unknown, o) => o,
            (s, Equality::Unknown) => s,
            _ => Equality::Different,
        }
    }
}

/// Compares the authorship of two names.
pub trait AuthorComparator: Send + Sync {
    fn compare(&self, query: &dyn ScientificName, candidate: &dyn ScientificName) -> Equality;
}
