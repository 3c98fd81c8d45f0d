//! Parsed name values as they arrive from the name parser.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::rank::Rank;

/// Kind of name as detected by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NameType {
    Scientific,
    Virus,
    HybridFormula,
    Informal,
    Otu,
    Placeholder,
    NoName,
}

impl NameType {
    /// Name types that may be inserted into the names index.
    pub fn is_indexable(&self) -> bool {
        matches!(
            self,
            NameType::Scientific | NameType::HybridFormula | NameType::Virus | NameType::Otu
        )
    }
}

impl Default for NameType {
    fn default() -> Self {
        NameType::Scientific
    }
}

/// Nomenclatural code governing a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NomCode {
    Bacterial,
    Botanical,
    Cultivars,
    Phytosociological,
    Virus,
    Zoological,
}

/// A single authorship: author team, ex authors and year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorship {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ex_authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

impl Authorship {
    pub fn new(authors: Vec<String>, year: Option<String>) -> Self {
        Self {
            authors,
            ex_authors: Vec::new(),
            year,
        }
    }

    /// Convenience constructor mirroring the common "year, authors..." form
    pub fn year_authors(year: Option<&str>, authors: &[&str]) -> Self {
        Self::new(
            authors.iter().map(|a| a.to_string()).collect(),
            year.map(str::to_string),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.authors.is_empty() && self.ex_authors.is_empty() && self.year.is_none()
    }
}

fn write_team(f: &mut fmt::Formatter<'_>, team: &[String]) -> fmt::Result {
    for (i, author) in team.iter().enumerate() {
        if i > 0 {
            let sep = if i + 1 == team.len() { " & " } else { ", " };
            f.write_str(sep)?;
        }
        f.write_str(author)?;
    }
    Ok(())
}

/// Formats as `Ex ex Authors, year`.
impl fmt::Display for Authorship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.ex_authors.is_empty() {
            write_team(f, &self.ex_authors)?;
            if !self.authors.is_empty() {
                f.write_str(" ex ")?;
            }
        }
        write_team(f, &self.authors)?;
        if let Some(year) = &self.year {
            if !self.authors.is_empty() || !self.ex_authors.is_empty() {
                f.write_str(", ")?;
            }
            f.write_str(year)?;
        }
        Ok(())
    }
}

/// Full authorship string of parsed parts, `(basionym) combination`.
pub fn format_authorship(combination: &Authorship, basionym: &Authorship) -> Option<String> {
    match (combination.is_empty(), basionym.is_empty()) {
        (true, true) => None,
        (true, false) => Some(format!("({})", basionym)),
        (false, true) => Some(combination.to_string()),
        (false, false) => Some(format!("({}) {}", basionym, combination)),
    }
}

/// Name parts shared by query names and index names.
pub trait ScientificName {
    fn scientific_name(&self) -> &str;
    fn authorship(&self) -> Option<&str>;
    fn rank(&self) -> Option<Rank>;
    fn combination_authorship(&self) -> &Authorship;
    fn basionym_authorship(&self) -> &Authorship;

    /// The non blank authorship string, else the formatted parsed authorship.
    fn full_authorship(&self) -> Option<Cow<'_, str>> {
        match self.authorship().map(str::trim).filter(|a| !a.is_empty()) {
            Some(a) => Some(Cow::Borrowed(a)),
            None => format_authorship(self.combination_authorship(), self.basionym_authorship())
                .map(Cow::Owned),
        }
    }

    /// True if a non blank authorship string or parsed authorship is present.
    fn has_authorship(&self) -> bool {
        self.full_authorship().is_some()
    }

    /// Scientific name followed by the authorship, if any.
    fn label(&self) -> String {
        match self.full_authorship() {
            Some(a) => format!("{} {}", self.scientific_name(), a),
            None => self.scientific_name().to_string(),
        }
    }
}

/// A parsed name used to query the names index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Name {
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
}

impl Name {
    /// Creates a scientific name with an optional rank and no authorship.
    pub fn new(scientific_name: impl Into<String>, rank: Option<Rank>) -> Self {
        Self {
            scientific_name: scientific_name.into(),
            rank,
            ..Default::default()
        }
    }

    /// Builder style setter for the authorship string
    pub fn with_authorship(mut self, authorship: impl Into<String>) -> Self {
        self.authorship = Some(authorship.into());
        self
    }

    pub fn with_type(mut self, name_type: NameType) -> Self {
        self.name_type = name_type;
        self
    }

    pub fn with_code(mut self, code: NomCode) -> Self {
        self.code = Some(code);
        self
    }
}

impl ScientificName for Name {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label() {
        let n = Name::new("Larus fuscus", Some(Rank::Species));
        assert_eq!(n.label(), "Larus fuscus");
        assert!(!n.has_authorship());

        let n = n.with_authorship("Linnaeus, 1758");
        assert_eq!(n.label(), "Larus fuscus Linnaeus, 1758");
        assert!(n.has_authorship());
    }

    #[test]
    fn test_blank_authorship_is_none() {
        let n = Name::new("Abies alba", None).with_authorship("  ");
        assert!(!n.has_authorship());
        assert_eq!(n.label(), "Abies alba");
    }

    #[test]
    fn test_parsed_authorship_counts() {
        let mut n = Name::new("Abies alba", None);
        n.combination_authorship = Authorship::year_authors(Some("1768"), &["Mill."]);
        assert!(n.has_authorship());
        assert_eq!(n.label(), "Abies alba Mill., 1768");
    }

    #[test]
    fn test_format_authorship() {
        let comb = Authorship::year_authors(None, &["H.Karst."]);
        let bas = Authorship::year_authors(None, &["L."]);
        assert_eq!(format_authorship(&comb, &bas).unwrap(), "(L.) H.Karst.");
        assert_eq!(format_authorship(&Authorship::default(), &bas).unwrap(), "(L.)");
        assert!(format_authorship(&Authorship::default(), &Authorship::default()).is_none());

        let mut team = Authorship::year_authors(Some("1805"), &["Lam.", "DC.", "Poir."]);
        assert_eq!(team.to_string(), "Lam., DC. & Poir., 1805");
        team.ex_authors = vec!["Willd.".to_string()];
        assert_eq!(team.to_string(), "Willd. ex Lam., DC. & Poir., 1805");
    }

    #[test]
    fn test_authorship_string_wins_over_parsed_parts() {
        let mut n = Name::new("Abies alba", None).with_authorship("Miller");
        n.combination_authorship = Authorship::year_authors(None, &["Mill."]);
        assert_eq!(n.full_authorship().as_deref(), Some("Miller"));
    }

    #[test]
    fn test_json_shape() {
        let n: Name = serde_json::from_str(
            r#"{"scientificName":"Puma concolor","authorship":"(Linnaeus, 1771)","rank":"SPECIES","type":"SCIENTIFIC"}"#,
        )
        .unwrap();
        assert_eq!(n.scientific_name, "Puma concolor");
        assert_eq!(n.rank, Some(Rank::Species));
        assert_eq!(n.name_type, NameType::Scientific);
    }

    #[test]
    fn test_indexable_types() {
        assert!(NameType::Scientific.is_indexable());
        assert!(NameType::Otu.is_indexable());
        assert!(!NameType::Placeholder.is_indexable());
        assert!(!NameType::Informal.is_indexable());
    }
}
