//! Normalized single authors.

use crate::model::Authorship;
use crate::normalizer::fold_to_ascii;

/// Author team members that carry no identity
const IGNORED: &[&str] = &["al", "et", "and", "f", "fil", "filius", "jr", "sr"];

/// A normalized author split into surname and initials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub fullname: String,
    pub surname: String,
    pub initials: Vec<char>,
}

impl Author {
    /// Parses an already normalized author string.
    ///
    /// Single letter words are initials, the last longer word is the surname.
    /// A lone initial like `l` for Linnaeus becomes the surname itself.
    pub fn new(normalized: &str) -> Self {
        let words: Vec<&str> = normalized.split_whitespace().collect();
        let surname_idx = words.iter().rposition(|w| w.len() > 1);
        let (surname, initials) = match surname_idx {
            Some(idx) => (
                words[idx].to_string(),
                words
                    .iter()
                    .enumerate()
                    .filter(|(i, w)| *i != idx && w.len() == 1)
                    .filter_map(|(_, w)| w.chars().next())
                    .collect(),
            ),
            None => (words.last().map(|w| w.to_string()).unwrap_or_default(), Vec::new()),
        };
        Self {
            fullname: words.join(" "),
            surname,
            initials,
        }
    }

    /// True if both authors carry initials and the first ones differ.
    pub fn initials_differ(&self, other: &Author) -> bool {
        match (self.initials.first(), other.initials.first()) {
            (Some(a), Some(b)) => a != b,
            _ => false,
        }
    }
}

/// Lower case ASCII form of an author, punctuation removed.
///
/// Returns `None` for authors that carry no identity such as `al.`.
pub fn normalize_author(author: &str) -> Option<String> {
    let folded = fold_to_ascii(author).to_lowercase();
    let cleaned: String = folded
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();
    let words: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|w| !IGNORED.contains(w))
        .collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

/// Normalized authors of an authorship, ex authors excluded.
pub fn normalize_team(authorship: &Authorship) -> Vec<String> {
    authorship
        .authors
        .iter()
        .filter_map(|a| normalize_author(a))
        .collect()
}
