//! Word-order-insensitive fuzzy string similarity.
//!
//! Scores are in `0.0..=100.0`. The base ratio is the normalized indel
//! similarity `100 * (1 - indel(a, b) / (|a| + |b|))`, counted over chars.

use std::collections::BTreeSet;

/// Indel (insert/delete only) edit distance between two strings.
pub fn indel_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    a.len() + b.len() - 2 * lcs_len(&a, &b)
}

/// Length of the longest common subsequence.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Normalized indel similarity between two strings. Two empty strings
/// score 100.
pub fn ratio(a: &str, b: &str) -> f64 {
    let len_sum = a.chars().count() + b.chars().count();
    if len_sum == 0 {
        return 100.0;
    }
    let distance = indel_distance(a, b);
    100.0 * (1.0 - distance as f64 / len_sum as f64)
}

/// Token-set similarity.
///
/// Both inputs are split on whitespace into word sets. With `sect` the sorted
/// shared words and `rest_a`/`rest_b` the sorted words unique to each side,
/// the score is the best ratio among `sect` vs `sect rest_a`, `sect` vs
/// `sect rest_b`, and `sect rest_a` vs `sect rest_b`. A side with no words
/// scores 0.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let words_a: BTreeSet<&str> = a.split_whitespace().collect();
    let words_b: BTreeSet<&str> = b.split_whitespace().collect();

    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let sect = join(words_a.intersection(&words_b));
    let rest_a = join(words_a.difference(&words_b));
    let rest_b = join(words_b.difference(&words_a));

    let combined_a = concat(&sect, &rest_a);
    let combined_b = concat(&sect, &rest_b);

    ratio(&sect, &combined_a)
        .max(ratio(&sect, &combined_b))
        .max(ratio(&combined_a, &combined_b))
}

fn join<'a, 'b: 'a>(words: impl Iterator<Item = &'a &'b str>) -> String {
    words.copied().collect::<Vec<_>>().join(" ")
}

fn concat(sect: &str, rest: &str) -> String {
    match (sect.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (_, true) => sect.to_string(),
        _ => format!("{} {}", sect, rest),
    }
}
