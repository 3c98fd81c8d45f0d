//! Default authorship comparator.

use std::borrow::Cow;

use super::author::{normalize_team, Author};
use super::parser::parse_authorship;
use super::{AuthorComparator, Equality};
use crate::model::{Authorship, ScientificName};

/// Surnames sharing a prefix of this length are considered equal
const MIN_COMMON_PREFIX: usize = 4;

/// Accepted difference in publication years
const YEAR_TOLERANCE: i32 = 1;

/// Compares combination and basionym authorship with fuzzy author matching.
///
/// Authors are ASCII folded and compared by surname; abbreviations and a
/// shared surname prefix count as equal, differing first initials do not.
/// Years within one year of each other are equal.
#[derive(Debug, Clone, Default)]
pub struct BasicAuthorComparator;

impl BasicAuthorComparator {
    pub fn new() -> Self {
        Self
    }

    /// Compares a single authorship: year first, then the author team.
    pub fn compare_authorship(&self, a1: &Authorship, a2: &Authorship) -> Equality {
        let year = compare_years(a1.year.as_deref(), a2.year.as_deref());
        if year == Equality::Different {
            return year;
        }
        year.and(compare_teams(&normalize_team(a1), &normalize_team(a2)))
    }
}

impl AuthorComparator for BasicAuthorComparator {
    fn compare(&self, query: &dyn ScientificName, candidate: &dyn ScientificName) -> Equality {
        let (q_comb, q_bas) = authorship_parts(query);
        let (c_comb, c_bas) = authorship_parts(candidate);

        let recomb = self.compare_authorship(&q_comb, &c_comb);
        if recomb != Equality::Unknown {
            return recomb;
        }
        let original = self.compare_authorship(&q_bas, &c_bas);
        if original != Equality::Unknown {
            return original;
        }
        // missing brackets are common, compare across them
        let across = if q_comb.is_empty() {
            self.compare_authorship(&q_bas, &c_comb)
        } else if q_bas.is_empty() {
            self.compare_authorship(&q_comb, &c_bas)
        } else {
            Equality::Unknown
        };
        if across == Equality::Equal {
            Equality::Equal
        } else {
            Equality::Unknown
        }
    }
}

/// Parsed combination and basionym authorship, falling back to parsing the
/// authorship string when no parsed parts exist.
fn authorship_parts(name: &dyn ScientificName) -> (Cow<'_, Authorship>, Cow<'_, Authorship>) {
    let comb = name.combination_authorship();
    let bas = name.basionym_authorship();
    if comb.is_empty() && bas.is_empty() {
        if let Some(a) = name.authorship() {
            let parsed = parse_authorship(a);
            return (Cow::Owned(parsed.combination), Cow::Owned(parsed.basionym));
        }
    }
    (Cow::Borrowed(comb), Cow::Borrowed(bas))
}

fn parse_year(year: Option<&str>) -> Option<i32> {
    let digits: String = year?.chars().filter(|c| c.is_ascii_digit()).take(4).collect();
    if digits.len() == 4 {
        digits.parse().ok()
    } else {
        None
    }
}

/// Compares two publication years with a tolerance of one year.
pub fn compare_years(y1: Option<&str>, y2: Option<&str>) -> Equality {
    match (parse_year(y1), parse_year(y2)) {
        (Some(a), Some(b)) if (a - b).abs() <= YEAR_TOLERANCE => Equality::Equal,
        (Some(_), Some(_)) => Equality::Different,
        _ => Equality::Unknown,
    }
}

/// A single matching author is enough for the teams to be equal.
fn compare_teams(team1: &[String], team2: &[String]) -> Equality {
    if team1.is_empty() || team2.is_empty() {
        return Equality::Unknown;
    }
    if team1 == team2 {
        return Equality::Equal;
    }
    for a1 in team1.iter().map(|a| Author::new(a)) {
        for a2 in team2.iter().map(|a| Author::new(a)) {
            if compare_authors(&a1, &a2) == Equality::Equal {
                return Equality::Equal;
            }
        }
    }
    Equality::Different
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

fn compare_authors(a1: &Author, a2: &Author) -> Equality {
    if a1.fullname == a2.fullname {
        return Equality::Equal;
    }
    let common = common_prefix_len(&a1.surname, &a2.surname);
    if a1.surname == a2.surname || common >= MIN_COMMON_PREFIX {
        return if a1.initials_differ(a2) {
            Equality::Different
        } else {
            Equality::Equal
        };
    }
    // abbreviated surname, fully contained at the start of the other
    let abbreviated = (common == a1.surname.len() && a2.surname.starts_with(&a1.surname))
        || (common == a2.surname.len() && a1.surname.starts_with(&a2.surname));
    if abbreviated && common > 0 && !a1.initials_differ(a2) {
        return Equality::Equal;
    }
    Equality::Different
}
