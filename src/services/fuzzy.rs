//! Fuzzy title matching.
//!
//! The assistant refers to records by whatever title the model remembers
//! ("kampania piekarni", "case study Łódzka Piekarnia"), so lookups compare
//! slug-normalized strings and tolerate typos via Levenshtein distance.

use crate::services::slug::slugify;

/// Minimum score for a record to count as the one the user meant
pub const MATCH_THRESHOLD: f64 = 0.45;

/// Levenshtein (edit) distance between two strings, counted in chars.
#[must_use]
pub fn levenshtein_distance(source: &str, target: &str) -> usize {
    let target_chars: Vec<char> = target.chars().collect();
    let mut previous_row: Vec<usize> = (0..=target_chars.len()).collect();

    for (source_idx, source_char) in source.chars().enumerate() {
        let mut current_row = Vec::with_capacity(previous_row.len());
        current_row.push(source_idx + 1);

        for (target_idx, target_char) in target_chars.iter().enumerate() {
            let cost = usize::from(source_char != *target_char);
            let deletion = previous_row.get(target_idx + 1).map_or(usize::MAX, |v| v + 1);
            let insertion = current_row.get(target_idx).map_or(usize::MAX, |v| v + 1);
            let substitution = previous_row.get(target_idx).map_or(usize::MAX, |v| v + cost);
            current_row.push(deletion.min(insertion).min(substitution));
        }

        previous_row = current_row;
    }

    previous_row.last().copied().unwrap_or(0)
}

/// Score from 0.0 to 1.0 of how well `query` names `target`.
///
/// Tiers: identical after normalization, prefix, substring, shared words,
/// then edit distance for typos.
#[must_use]
pub fn fuzzy_score(query: &str, target: &str) -> f64 {
    let query = slugify(query);
    let target = slugify(target);

    if query.is_empty() || target.is_empty() {
        return 0.0;
    }
    if query == target {
        return 1.0;
    }
    if target.starts_with(&query) {
        return 0.95;
    }
    if target.contains(&query) || query.contains(&target) {
        return 0.85;
    }

    let query_words: Vec<&str> = query.split('-').collect();
    let target_words: Vec<&str> = target.split('-').collect();
    let shared = query_words
        .iter()
        .filter(|word| word.len() > 2 && target_words.contains(word))
        .count();
    let word_score = if shared > 0 {
        0.5 + 0.3 * shared as f64 / query_words.len().max(target_words.len()) as f64
    } else {
        0.0
    };

    let distance = levenshtein_distance(&query, &target);
    let max_len = query.chars().count().max(target.chars().count());
    let similarity = 1.0 - distance as f64 / max_len as f64;
    let edit_score = if similarity >= 0.5 { similarity * 0.7 } else { 0.0 };

    word_score.max(edit_score)
}

/// Picks the best-scoring item above [`MATCH_THRESHOLD`], if any.
pub fn best_match<'a, T, F>(query: &str, items: &'a [T], key: F) -> Option<(&'a T, f64)>
where
    F: Fn(&T) -> &str,
{
    items
        .iter()
        .map(|item| (item, fuzzy_score(query, key(item))))
        .filter(|(_, score)| *score >= MATCH_THRESHOLD)
        .max_by(|first, second| {
            first
                .1
                .partial_cmp(&second.1)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}
