//! Candidate scoring and match classification
//!
//! All names sharing a normalized key form the candidate pool of a query.
//! Candidates are filtered and scored in a single pass:
//!
//! - reject conflicting rank buckets
//! - reject authored candidates for authorless queries
//! - identical label: 5
//! - otherwise: authorship comparator DIFFERENT rejects, an identical
//!   authorship string adds 3, comparator EQUAL adds 1, an identical
//!   scientific name adds 1
//!
//! Only candidates with the best score survive.

use tracing::debug;

use crate::authorship::{AuthorComparator, Equality};
use crate::model::{IndexName, MatchType, Name, NameKey, NameMatch, Rank, ScientificName};
use crate::normalizer::{norm_exact, normalized_ascii, normalized_ascii_opt};

const SCORE_LABEL: u32 = 5;
const SCORE_AUTHORSHIP: u32 = 3;
const SCORE_AUTHORS_EQUAL: u32 = 1;
const SCORE_NAME: u32 = 1;

fn same(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Query values normalized once per match.
struct Query<'a> {
    name: &'a Name,
    rank: Rank,
    canonical: bool,
    label: String,
    scientific_name: String,
    authorship: String,
}

impl<'a> Query<'a> {
    fn new(name: &'a Name) -> Self {
        Self {
            name,
            rank: Rank::normalize(name.rank),
            canonical: !name.has_authorship(),
            label: normalized_ascii(&name.label()),
            scientific_name: normalized_ascii(&name.scientific_name),
            authorship: normalized_ascii_opt(name.full_authorship().as_deref()),
        }
    }

    fn score(&self, candidate: &IndexName, comparator: &dyn AuthorComparator) -> Option<u32> {
        if self.rank.conflicts_with(candidate.rank_or_unranked()) {
            return None;
        }
        if self.canonical && candidate.has_authorship() {
            return None;
        }
        if same(&normalized_ascii(&candidate.label()), &self.label) {
            return Some(SCORE_LABEL);
        }

        let mut score = 0;
        if !self.canonical {
            let equality = comparator.compare(self.name, candidate);
            if equality == Equality::Different {
                return None;
            }
            let candidate_authorship = normalized_ascii_opt(candidate.full_authorship().as_deref());
            if !self.authorship.is_empty() && same(&candidate_authorship, &self.authorship) {
                score += SCORE_AUTHORSHIP;
            } else if equality == Equality::Equal {
                score += SCORE_AUTHORS_EQUAL;
            }
        }
        if same(&normalized_ascii(&candidate.scientific_name), &self.scientific_name) {
            score += SCORE_NAME;
        }
        Some(score)
    }

    /// Label and rank bucket are identical.
    fn is_exact(&self, candidate: &IndexName) -> bool {
        same(
            &norm_exact(&normalized_ascii(&candidate.label())),
            &norm_exact(&self.label),
        ) && self.rank == candidate.rank_or_unranked().normalized()
    }

    fn is_canonical(&self, candidate: &IndexName) -> bool {
        !candidate.has_authorship()
            && same(&normalized_ascii(&candidate.scientific_name), &self.scientific_name)
    }
}

fn lowest_key(names: &[IndexName]) -> Option<usize> {
    names
        .iter()
        .enumerate()
        .min_by_key(|(_, n)| n.key.unwrap_or(NameKey::MAX))
        .map(|(idx, _)| idx)
}

/// Scores the candidate pool of a query and classifies the outcome.
///
/// With `verbose` all other candidates of the pool are returned as
/// alternatives.
pub fn match_candidates(
    name: &Name,
    candidates: Vec<IndexName>,
    comparator: &dyn AuthorComparator,
    verbose: bool,
) -> NameMatch {
    let query = Query::new(name);

    let mut best = 0;
    let mut survivors: Vec<&IndexName> = Vec::new();
    for candidate in &candidates {
        let Some(score) = query.score(candidate, comparator) else {
            continue;
        };
        if score > best {
            best = score;
            survivors.clear();
            survivors.push(candidate);
        } else if score == best {
            survivors.push(candidate);
        }
    }

    let mut result = match survivors.len() {
        0 => NameMatch::no_match(),
        1 => {
            let chosen = survivors[0].clone();
            let match_type = if query.is_exact(&chosen) {
                MatchType::Exact
            } else if query.is_canonical(&chosen) {
                MatchType::Canonical
            } else {
                MatchType::Variant
            };
            NameMatch::of(chosen, match_type)
        }
        _ => {
            let authorless: Vec<IndexName> = survivors
                .iter()
                .filter(|n| !n.has_authorship())
                .map(|n| (*n).clone())
                .collect();
            if authorless.len() == 1 {
                NameMatch::of(authorless[0].clone(), MatchType::Canonical)
            } else {
                let pool: Vec<IndexName> = if authorless.is_empty() {
                    survivors.iter().map(|n| (*n).clone()).collect()
                } else {
                    authorless
                };
                debug!(
                    name = %name.label(),
                    candidates = pool.len(),
                    score = best,
                    "ambiguous match, picking lowest key"
                );
                match lowest_key(&pool) {
                    Some(idx) => NameMatch::of(pool[idx].clone(), MatchType::Ambiguous),
                    None => NameMatch::no_match(),
                }
            }
        }
    };

    if verbose {
        let chosen = result.key();
        result.alternatives = Some(
            candidates
                .into_iter()
                .filter(|c| chosen.is_none() || c.key != chosen)
                .collect(),
        );
    }
    result
}
