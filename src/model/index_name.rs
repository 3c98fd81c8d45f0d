//! The stored names index record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::name::{Authorship, Name, NameType, NomCode, ScientificName};
use super::rank::Rank;

/// Integer identity of an index name
pub type NameKey = u32;

/// A deduplicated name stored in the names index.
///
/// Contains the main name properties of a [`Name`] without any dataset specifics.
/// `key`, `canonical_id`, `rank` and `scientific_name` are mandatory once stored,
/// see [`crate::store::check`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexName {
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<NameKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_id: Option<NameKey>,
    pub scientific_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorship: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<Rank>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uninomial: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infrageneric_epithet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specific_epithet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infraspecific_epithet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cultivar_epithet: Option<String>,
    #[serde(default, skip_serializing_if = "Authorship::is_empty")]
    pub combination_authorship: Authorship,
    #[serde(default, skip_serializing_if = "Authorship::is_empty")]
    pub basionym_authorship: Authorship,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<NomCode>,
    #[serde(default, rename = "type")]
    pub name_type: NameType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

impl IndexName {
    /// Builds an unkeyed index name from a parsed name, bucketing its rank.
    pub fn from_name(n: &Name) -> Self {
        Self {
            key: None,
            canonical_id: None,
            scientific_name: n.scientific_name.clone(),
            authorship: n.full_authorship().map(|a| a.into_owned()),
            rank: Some(Rank::normalize(n.rank)),
            uninomial: n.uninomial.clone(),
            genus: n.genus.clone(),
            infrageneric_epithet: n.infrageneric_epithet.clone(),
            specific_epithet: n.specific_epithet.clone(),
            infraspecific_epithet: n.infraspecific_epithet.clone(),
            cultivar_epithet: n.cultivar_epithet.clone(),
            combination_authorship: n.combination_authorship.clone(),
            basionym_authorship: n.basionym_authorship.clone(),
            code: n.code,
            name_type: n.name_type,
            created: None,
        }
    }

    /// Creates the authorless canonical sibling of this name.
    ///
    /// Canonical siblings are rankless so that every rank variant of the same
    /// spelling can share them.
    pub fn new_canonical(&self) -> Self {
        Self {
            key: None,
            canonical_id: None,
            scientific_name: self.scientific_name.clone(),
            authorship: None,
            rank: Some(Rank::Unranked),
            uninomial: self.uninomial.clone(),
            genus: self.genus.clone(),
            infrageneric_epithet: self.infrageneric_epithet.clone(),
            specific_epithet: self.specific_epithet.clone(),
            infraspecific_epithet: self.infraspecific_epithet.clone(),
            cultivar_epithet: self.cultivar_epithet.clone(),
            combination_authorship: Authorship::default(),
            basionym_authorship: Authorship::default(),
            code: self.code,
            name_type: self.name_type,
            created: None,
        }
    }

    /// True if this record is its own canonical.
    pub fn is_canonical(&self) -> bool {
        self.key.is_some() && self.key == self.canonical_id
    }

    /// Rank of the record, UNRANKED when missing.
    pub fn rank_or_unranked(&self) -> Rank {
        self.rank.unwrap_or(Rank::Unranked)
    }

    /// Label followed by the rank and key, for log output.
    pub fn label_with_rank(&self) -> String {
        format!("{} [{}]", self.label(), self.rank_or_unranked())
    }
}

impl ScientificName for IndexName {
    fn scientific_name(&self) -> &str {
        &self.scientific_name
    }

    fn authorship(&self) -> Option<&str> {
        self.authorship.as_deref()
    }

    fn rank(&self) -> Option<Rank> {
        self.rank
    }

    fn combination_authorship(&self) -> &Authorship {
        &self.combination_authorship
    }

    fn basionym_authorship(&self) -> &Authorship {
        &self.basionym_authorship
    }
}
