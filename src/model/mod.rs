//! Data model of the names index
//!
//! - [`Name`]: a parsed query name as produced by the external name parser
//! - [`IndexName`]: a deduplicated record stored in the index
//! - [`NameMatch`]: the classified result of a match
//! - [`Rank`]: full rank vocabulary with its 7 matching buckets

mod index_name;
mod name;
mod name_match;
mod rank;

pub use index_name::{IndexName, NameKey};
pub use name::{format_authorship, Authorship, Name, NameType, NomCode, ScientificName};
pub use name_match::{MatchType, NameMatch};
pub use rank::{Rank, UnknownRank};
