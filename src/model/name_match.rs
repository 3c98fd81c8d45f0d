//! Match results returned by the names index.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::index_name::{IndexName, NameKey};

/// Classification of a match outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchType {
    /// Full label and rank bucket match
    Exact,
    /// Matched the authorless canonical form of the name
    Canonical,
    /// Matched a spelling or authorship variant
    Variant,
    /// Several candidates scored equally
    Ambiguous,
    /// No candidate survived
    None,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "EXACT",
            MatchType::Canonical => "CANONICAL",
            MatchType::Variant => "VARIANT",
            MatchType::Ambiguous => "AMBIGUOUS",
            MatchType::None => "NONE",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of matching a name against the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<IndexName>,
    #[serde(rename = "type")]
    pub match_type: MatchType,
    /// Other candidates of the pool, only populated in verbose mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternatives: Option<Vec<IndexName>>,
}

impl NameMatch {
    pub fn no_match() -> Self {
        Self {
            name: None,
            match_type: MatchType::None,
            alternatives: None,
        }
    }

    pub fn of(name: IndexName, match_type: MatchType) -> Self {
        Self {
            name: Some(name),
            match_type,
            alternatives: None,
        }
    }

    pub fn has_match(&self) -> bool {
        self.name.is_some()
    }

    /// Key of the matched name, if any
    pub fn key(&self) -> Option<NameKey> {
        self.name.as_ref().and_then(|n| n.key)
    }
}

impl fmt::Display for NameMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(n) => write!(
                f,
                "{} match: {} #{}",
                self.match_type,
                n.label_with_rank(),
                n.key.map(|k| k.to_string()).unwrap_or_default()
            ),
            None => write!(f, "{} match", self.match_type),
        }
    }
}
