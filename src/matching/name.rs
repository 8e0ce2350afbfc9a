// src/matching/name.rs - Word-level and edit-distance heuristics for person names

use std::fmt;
use strsim::levenshtein;

/// Token separating a primary name from a maiden name ("ada obi nee eze").
pub const MAIDEN_NAME_MARKER: &str = "nee";

const MAX_NAME_EDIT_DISTANCE: usize = 2;
const MAX_SHORT_NAME_EDIT_DISTANCE_STRICT: usize = 1;
const MAX_MAIDEN_NAME_EDIT_DISTANCE: usize = 2;
/// Names with fewer words than this get the tighter strict rules.
const MIN_WORDS_FOR_TOLERANCE_STRICT: usize = 2;

/// Tolerance level used when comparing two names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchStrictness {
    /// Used to build the initial duplicate graph.
    Permissive,
    /// Used to break up oversized components.
    Strict,
}

impl fmt::Display for MatchStrictness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStrictness::Permissive => write!(f, "permissive"),
            MatchStrictness::Strict => write!(f, "strict"),
        }
    }
}

/// Lower-cases a name and splits it on whitespace.
pub fn tokenize_name(name: &str) -> Vec<String> {
    name.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// True when both sequences hold the same words, ignoring order.
pub fn same_words<S: AsRef<str>>(words_1: &[S], words_2: &[S]) -> bool {
    if words_1.len() != words_2.len() {
        return false;
    }
    let mut sorted_1: Vec<&str> = words_1.iter().map(AsRef::as_ref).collect();
    let mut sorted_2: Vec<&str> = words_2.iter().map(AsRef::as_ref).collect();
    sorted_1.sort_unstable();
    sorted_2.sort_unstable();
    sorted_1 == sorted_2
}

/// True when dropping exactly one word from the longer sequence yields the shorter one.
pub fn one_extra_word<S: AsRef<str>>(words_1: &[S], words_2: &[S]) -> bool {
    if words_1.len().abs_diff(words_2.len()) != 1 {
        return false;
    }

    let (longer, shorter) = if words_1.len() > words_2.len() {
        (words_1, words_2)
    } else {
        (words_2, words_1)
    };

    (0..longer.len()).any(|skipped| {
        longer
            .iter()
            .enumerate()
            .filter(|(k, _)| *k != skipped)
            .map(|(_, word)| word.as_ref())
            .eq(shorter.iter().map(AsRef::as_ref))
    })
}

pub fn similar_words_permissive<S: AsRef<str>>(words_1: &[S], words_2: &[S]) -> bool {
    same_words(words_1, words_2) || one_extra_word(words_1, words_2)
}

/// Single-word names get no extra-word tolerance.
pub fn similar_words_strict<S: AsRef<str>>(words_1: &[S], words_2: &[S]) -> bool {
    if words_1.len() < MIN_WORDS_FOR_TOLERANCE_STRICT
        || words_2.len() < MIN_WORDS_FOR_TOLERANCE_STRICT
    {
        return same_words(words_1, words_2);
    }
    similar_words_permissive(words_1, words_2)
}

/// Levenshtein distance between the space-joined word sequences.
pub fn string_distance_between_words<S: AsRef<str>>(words_1: &[S], words_2: &[S]) -> usize {
    levenshtein(&join_words(words_1), &join_words(words_2))
}

fn join_words<S: AsRef<str>>(words: &[S]) -> String {
    words.iter().map(AsRef::as_ref).collect::<Vec<&str>>().join(" ")
}

pub fn similar_name_cores_permissive<S: AsRef<str>>(name_1: &[S], name_2: &[S]) -> bool {
    string_distance_between_words(name_1, name_2) <= MAX_NAME_EDIT_DISTANCE
        || similar_words_permissive(name_1, name_2)
}

pub fn similar_name_cores_strict<S: AsRef<str>>(name_1: &[S], name_2: &[S]) -> bool {
    let cutoff = if name_1.len() < MIN_WORDS_FOR_TOLERANCE_STRICT
        || name_2.len() < MIN_WORDS_FOR_TOLERANCE_STRICT
    {
        MAX_SHORT_NAME_EDIT_DISTANCE_STRICT
    } else {
        MAX_NAME_EDIT_DISTANCE
    };

    string_distance_between_words(name_1, name_2) <= cutoff || similar_words_strict(name_1, name_2)
}

/// Splits at the first maiden-name marker into (primary name, maiden name).
/// Without a marker the maiden name is empty.
pub fn split_at_maiden_name_marker<S: AsRef<str>>(words: &[S]) -> (&[S], &[S]) {
    match words
        .iter()
        .position(|word| word.as_ref() == MAIDEN_NAME_MARKER)
    {
        Some(idx) => (&words[..idx], &words[idx + 1..]),
        None => (words, &words[words.len()..]),
    }
}

/// Compares two raw names.
///
/// Maiden names only take part when both sides carry one; otherwise the
/// primary names alone decide. When both are present, the maiden names must
/// be within a small edit distance AND the primary names must match.
pub fn similar_names(name_1: &str, name_2: &str, strictness: MatchStrictness) -> bool {
    let words_1 = tokenize_name(name_1);
    let words_2 = tokenize_name(name_2);

    let (primary_1, maiden_1) = split_at_maiden_name_marker(&words_1);
    let (primary_2, maiden_2) = split_at_maiden_name_marker(&words_2);

    let similar_cores = match strictness {
        MatchStrictness::Permissive => similar_name_cores_permissive(primary_1, primary_2),
        MatchStrictness::Strict => similar_name_cores_strict(primary_1, primary_2),
    };

    if maiden_1.is_empty() || maiden_2.is_empty() {
        return similar_cores;
    }

    string_distance_between_words(maiden_1, maiden_2) <= MAX_MAIDEN_NAME_EDIT_DISTANCE
        && similar_cores
}

pub fn similar_names_permissive(name_1: &str, name_2: &str) -> bool {
    similar_names(name_1, name_2, MatchStrictness::Permissive)
}

pub fn similar_names_strict(name_1: &str, name_2: &str) -> bool {
    similar_names(name_1, name_2, MatchStrictness::Strict)
}
