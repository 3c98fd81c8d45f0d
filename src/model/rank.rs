//! Rank vocabulary and the coarse rank buckets used for matching.
//!
//! Ranks are declared from highest to lowest so the derived ordering can be
//! used for group checks. `Other` and `Unranked` sort last and are treated as
//! "no comparable rank".

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! ranks {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Taxonomic rank, ordered from highest to lowest.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum Rank {
            $($variant),+
        }

        impl Rank {
            /// Every rank in declaration order.
            pub const ALL: &'static [Rank] = &[$(Rank::$variant),+];

            /// Returns the upper case wire name, e.g. `SPECIES_AGGREGATE`
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Rank::$variant => $name),+
                }
            }
        }
    };
}

ranks! {
    Domain => "DOMAIN",
    Superkingdom => "SUPERKINGDOM",
    Kingdom => "KINGDOM",
    Subkingdom => "SUBKINGDOM",
    Infrakingdom => "INFRAKINGDOM",
    Superphylum => "SUPERPHYLUM",
    Phylum => "PHYLUM",
    Subphylum => "SUBPHYLUM",
    Infraphylum => "INFRAPHYLUM",
    Superclass => "SUPERCLASS",
    Class => "CLASS",
    Subclass => "SUBCLASS",
    Infraclass => "INFRACLASS",
    Parvclass => "PARVCLASS",
    Superlegion => "SUPERLEGION",
    Legion => "LEGION",
    Sublegion => "SUBLEGION",
    Infralegion => "INFRALEGION",
    Supercohort => "SUPERCOHORT",
    Cohort => "COHORT",
    Subcohort => "SUBCOHORT",
    Infracohort => "INFRACOHORT",
    Gigaorder => "GIGAORDER",
    Magnorder => "MAGNORDER",
    Grandorder => "GRANDORDER",
    Mirorder => "MIRORDER",
    Superorder => "SUPERORDER",
    Order => "ORDER",
    Nanorder => "NANORDER",
    Hypoorder => "HYPOORDER",
    Minorder => "MINORDER",
    Suborder => "SUBORDER",
    Infraorder => "INFRAORDER",
    Parvorder => "PARVORDER",
    Megafamily => "MEGAFAMILY",
    Grandfamily => "GRANDFAMILY",
    Superfamily => "SUPERFAMILY",
    Epifamily => "EPIFAMILY",
    Family => "FAMILY",
    Subfamily => "SUBFAMILY",
    Infrafamily => "INFRAFAMILY",
    Supertribe => "SUPERTRIBE",
    Tribe => "TRIBE",
    Subtribe => "SUBTRIBE",
    Infratribe => "INFRATRIBE",
    SupragenericName => "SUPRAGENERIC_NAME",
    Genus => "GENUS",
    Subgenus => "SUBGENUS",
    Infragenus => "INFRAGENUS",
    Supersection => "SUPERSECTION",
    Section => "SECTION",
    Subsection => "SUBSECTION",
    Superseries => "SUPERSERIES",
    Series => "SERIES",
    Subseries => "SUBSERIES",
    InfragenericName => "INFRAGENERIC_NAME",
    SpeciesAggregate => "SPECIES_AGGREGATE",
    Species => "SPECIES",
    InfraspecificName => "INFRASPECIFIC_NAME",
    Grex => "GREX",
    Klepton => "KLEPTON",
    Subspecies => "SUBSPECIES",
    CultivarGroup => "CULTIVAR_GROUP",
    Convariety => "CONVARIETY",
    InfrasubspecificName => "INFRASUBSPECIFIC_NAME",
    Proles => "PROLES",
    Natio => "NATIO",
    Aberration => "ABERRATION",
    Morph => "MORPH",
    Supervariety => "SUPERVARIETY",
    Variety => "VARIETY",
    Subvariety => "SUBVARIETY",
    Superform => "SUPERFORM",
    Form => "FORM",
    Subform => "SUBFORM",
    Pathovar => "PATHOVAR",
    Biovar => "BIOVAR",
    Chemovar => "CHEMOVAR",
    Morphovar => "MORPHOVAR",
    Phagovar => "PHAGOVAR",
    Serovar => "SEROVAR",
    Chemoform => "CHEMOFORM",
    FormaSpecialis => "FORMA_SPECIALIS",
    Lusus => "LUSUS",
    Cultivar => "CULTIVAR",
    Mutatio => "MUTATIO",
    Strain => "STRAIN",
    Other => "OTHER",
    Unranked => "UNRANKED",
}

impl Rank {
    /// True for OTHER and UNRANKED, which carry no comparable position.
    pub fn is_uncomparable(&self) -> bool {
        matches!(self, Rank::Other | Rank::Unranked)
    }

    /// Ranks above genus, including the family group.
    pub fn is_suprageneric(&self) -> bool {
        !self.is_uncomparable() && *self < Rank::Genus
    }

    pub fn is_family_group(&self) -> bool {
        (Rank::Megafamily..=Rank::Infratribe).contains(self)
    }

    pub fn is_genus_group(&self) -> bool {
        (Rank::Genus..=Rank::InfragenericName).contains(self)
    }

    pub fn is_species_or_below(&self) -> bool {
        !self.is_uncomparable() && *self >= Rank::SpeciesAggregate
    }

    /// Maps any rank onto one of the 7 matching buckets:
    /// UNRANKED, SUPRAGENERIC_NAME, FAMILY, GENUS, SPECIES, SUBSPECIES, VARIETY.
    pub fn normalized(self) -> Rank {
        if self.is_uncomparable() {
            Rank::Unranked
        } else if self.is_family_group() {
            Rank::Family
        } else if self.is_genus_group() {
            Rank::Genus
        } else if self.is_suprageneric() {
            Rank::SupragenericName
        } else if self <= Rank::Species {
            Rank::Species
        } else if self <= Rank::Convariety {
            Rank::Subspecies
        } else {
            Rank::Variety
        }
    }

    /// Normalizes an optional rank, treating a missing rank as UNRANKED.
    pub fn normalize(rank: Option<Rank>) -> Rank {
        rank.map(Rank::normalized).unwrap_or(Rank::Unranked)
    }

    /// True if both ranks fall into known buckets that differ.
    ///
    /// Unranked on either side never conflicts.
    pub fn conflicts_with(self, other: Rank) -> bool {
        let a = self.normalized();
        let b = other.normalized();
        a != Rank::Unranked && b != Rank::Unranked && a != b
    }
}

impl Default for Rank {
    fn default() -> Self {
        Rank::Unranked
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown rank name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown rank: {0}")]
pub struct UnknownRank(pub String);

impl FromStr for Rank {
    type Err = UnknownRank;

    /// Parses wire names case-insensitively, accepting spaces or dashes for underscores.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        Rank::ALL
            .iter()
            .find(|r| r.as_str() == wanted)
            .copied()
            .ok_or_else(|| UnknownRank(s.to_string()))
    }
}
