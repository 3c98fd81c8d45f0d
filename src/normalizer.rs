//! Scientific name normalization
//!
//! Two levels of normalization are used by the names index:
//!
//! - [`normalized_ascii`]: ASCII folding, hybrid sign removal and whitespace
//!   normalization. Used for exact label comparisons.
//! - [`normalize`]: additionally normalizes epithet spelling and grammatical
//!   gender so that common misspellings collide. Used to build [`index_key`],
//!   the lookup key of a candidate pool.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Placeholder for characters that have no ASCII representation
pub const NON_ASCII_PLACEHOLDER: char = '*';

const HYBRID_SIGN: char = '×';

/// Epithet endings reduced to `a`, longest first within each family.
const GENDER_ENDINGS: &[&str] = &["ei", "is", "us", "um", "on", "os", "e", "i", "a"];

/// Decomposes and strips diacritics, transliterating common ligatures.
///
/// Characters without an ASCII form are kept as is.
pub fn fold_to_ascii(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.nfd() {
        if is_combining_mark(c) {
            continue;
        }
        match c {
            'æ' => out.push_str("ae"),
            'Æ' => out.push_str("AE"),
            'œ' => out.push_str("oe"),
            'Œ' => out.push_str("OE"),
            'ß' => out.push_str("ss"),
            'þ' => out.push_str("th"),
            'Þ' => out.push_str("TH"),
            'ø' => out.push('o'),
            'Ø' => out.push('O'),
            'đ' | 'ð' => out.push('d'),
            'Đ' | 'Ð' => out.push('D'),
            'ł' => out.push('l'),
            'Ł' => out.push('L'),
            'ı' => out.push('i'),
            c => out.push(c),
        }
    }
    out
}

/// ASCII folded string with hybrid signs removed and whitespace collapsed.
///
/// Case is preserved, comparisons are expected to ignore case.
pub fn normalized_ascii(s: &str) -> String {
    let folded = fold_to_ascii(s);
    folded
        .split_whitespace()
        .map(|w| w.replace(HYBRID_SIGN, ""))
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// [`normalized_ascii`] for optional values, empty for `None`.
pub fn normalized_ascii_opt(s: Option<&str>) -> String {
    s.map(normalized_ascii).unwrap_or_default()
}

/// Collapses runs of dots, spaces and dashes into a single space.
pub fn norm_exact(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut gap = false;
    for c in s.chars() {
        if c == '.' || c == '-' || c.is_whitespace() {
            gap = true;
        } else {
            if gap && !out.is_empty() {
                out.push(' ');
            }
            gap = false;
            out.push(c);
        }
    }
    out
}

/// Replaces every non ASCII character with the given placeholder.
pub fn replace_non_ascii(s: &str, placeholder: char) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c } else { placeholder })
        .collect()
}

/// Normalizes a scientific name for fuzzy lookups.
///
/// The first word is only ASCII folded, every following word is treated as an
/// epithet and normalized by [`normalize_epithet`]. Hybrid markers and
/// punctuation are removed.
pub fn normalize(name: &str) -> String {
    let folded = fold_to_ascii(name);
    let cleaned: String = folded
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == HYBRID_SIGN || c == '-' {
                c
            } else {
                ' '
            }
        })
        .collect();

    let mut words: Vec<String> = Vec::new();
    for raw in cleaned.split_whitespace() {
        // standalone hybrid marker between name parts
        if !words.is_empty() && (raw == "x" || raw == "X") {
            continue;
        }
        let word = strip_hybrid_marker(raw);
        if word.is_empty() {
            continue;
        }
        if words.is_empty() {
            words.push(word);
        } else {
            words.push(normalize_epithet(&word));
        }
    }
    words.join(" ")
}

/// Removes hybrid signs and a hybrid `x` glued to a capitalized name part.
fn strip_hybrid_marker(word: &str) -> String {
    let word: String = word.chars().filter(|c| *c != HYBRID_SIGN).collect();
    let mut chars = word.chars();
    match (chars.next(), chars.next()) {
        (Some('x' | 'X'), Some(second)) if second.is_uppercase() => word[1..].to_string(),
        _ => word,
    }
}

/// Normalizes spelling variants of a single epithet.
///
/// - `th`, `rh`, `gh` lose their `h`
/// - non initial runs of `i`, `j`, `y` become a single `i`
/// - repeated letters are collapsed
/// - the gender ending is stemmed, see [`stem_epithet`]
pub fn normalize_epithet(epithet: &str) -> String {
    let capitalized = epithet.chars().next().map(char::is_uppercase).unwrap_or(false);
    let lower = epithet.to_lowercase();
    let chars: Vec<char> = lower.chars().collect();

    let mut dehyphed: Vec<char> = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        dehyphed.push(c);
        if matches!(c, 't' | 'r' | 'g') && chars.get(i + 1) == Some(&'h') {
            i += 1;
        }
        i += 1;
    }

    let mut out: Vec<char> = Vec::with_capacity(dehyphed.len());
    for (idx, c) in dehyphed.into_iter().enumerate() {
        let c = if idx > 0 && matches!(c, 'j' | 'y') { 'i' } else { c };
        if let Some(&prev) = out.last() {
            if prev == c && c.is_alphabetic() {
                continue;
            }
        }
        out.push(c);
    }

    let stemmed = stem_epithet(&out.into_iter().collect::<String>());
    if capitalized {
        let mut cs = stemmed.chars();
        match cs.next() {
            Some(first) => first.to_uppercase().chain(cs).collect(),
            None => stemmed,
        }
    } else {
        stemmed
    }
}

/// Reduces latin gender endings to a common `a` form.
pub fn stem_epithet(epithet: &str) -> String {
    if epithet.is_empty() {
        return String::new();
    }
    if let Some(stem) = epithet.strip_suffix("trix") {
        return format!("{}tor", stem);
    }
    for ending in GENDER_ENDINGS {
        if epithet.len() > ending.len() {
            if let Some(stem) = epithet.strip_suffix(ending) {
                return format!("{}a", stem);
            }
        }
    }
    epithet.to_string()
}

/// Builds the pure ASCII, lower case lookup key of a scientific name.
///
/// All spelling and authorship variants of a name share the same key.
pub fn index_key(scientific_name: &str) -> String {
    replace_non_ascii(&normalize(scientific_name).to_lowercase(), NON_ASCII_PLACEHOLDER)
}

/// True if the string contains at least one ASCII letter or digit.
pub fn has_ascii_alphanumeric(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_alphanumeric())
}
