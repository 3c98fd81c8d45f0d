//! Lightweight fallback parser for authorship strings.
//!
//! Names coming from the external parser usually carry parsed authorship
//! parts. When only the full authorship string is known it is split here
//! into `(basionym, year) combination, year` parts.

use crate::model::Authorship;

/// Combination and basionym authorship of a name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedAuthorship {
    pub combination: Authorship,
    pub basionym: Authorship,
}

impl ParsedAuthorship {
    pub fn is_empty(&self) -> bool {
        self.combination.is_empty() && self.basionym.is_empty()
    }
}

pub fn parse_authorship(authorship: &str) -> ParsedAuthorship {
    let trimmed = authorship.trim();
    if let Some(rest) = trimmed.strip_prefix('(') {
        if let Some(close) = rest.find(')') {
            return ParsedAuthorship {
                basionym: parse_part(&rest[..close]),
                combination: parse_part(&rest[close + 1..]),
            };
        }
    }
    ParsedAuthorship {
        combination: parse_part(trimmed),
        basionym: Authorship::default(),
    }
}

/// Parses `A, B & C ex D, 1999` style author teams.
fn parse_part(part: &str) -> Authorship {
    let (team, year) = split_year(part.trim());
    let (ex_team, team) = match find_word(&team, "ex") {
        Some((before, after)) => (before, after),
        None => (String::new(), team),
    };
    Authorship {
        authors: split_team(&team),
        ex_authors: split_team(&ex_team),
        year,
    }
}

/// Removes a trailing publication year.
fn split_year(part: &str) -> (String, Option<String>) {
    let words: Vec<&str> = part.split_whitespace().collect();
    if let Some((last, head)) = words.split_last() {
        let digits: String = last.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() == 4 && last.chars().next().map_or(false, |c| c.is_ascii_digit()) {
            let team = head.join(" ");
            let team = team.trim_end_matches(|c: char| c == ',' || c.is_whitespace());
            return (team.to_string(), Some(digits));
        }
    }
    (part.to_string(), None)
}

/// Splits around a standalone word, case insensitive.
fn find_word(s: &str, word: &str) -> Option<(String, String)> {
    let words: Vec<&str> = s.split_whitespace().collect();
    let idx = words
        .iter()
        .position(|w| w.trim_end_matches('.').eq_ignore_ascii_case(word))?;
    Some((words[..idx].join(" "), words[idx + 1..].join(" ")))
}

fn split_team(team: &str) -> Vec<String> {
    team.replace('&', ",")
        .replace(" et ", ",")
        .replace(" and ", ",")
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}
