//! String similarity measures for artist-name matching.
//!
//! All measures are case-insensitive and return a score in `[0, 1]`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Which similarity measure the resolver scores candidates with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Ratcliff/Obershelp "gestalt" ratio: twice the number of matching
    /// characters over the combined length.
    #[default]
    Gestalt,
    /// `1 - levenshtein / max_len`.
    Levenshtein,
    /// Jaro-Winkler, favouring shared prefixes.
    JaroWinkler,
}

impl SimilarityMetric {
    /// Score two names that have already been lowercased.
    pub fn score_lowercase(self, a: &str, b: &str) -> f64 {
        match self {
            Self::Gestalt => gestalt_ratio(a, b),
            Self::Levenshtein => strsim::normalized_levenshtein(a, b),
            Self::JaroWinkler => strsim::jaro_winkler(a, b),
        }
    }

    pub fn score(self, a: &str, b: &str) -> f64 {
        self.score_lowercase(&a.to_lowercase(), &b.to_lowercase())
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gestalt => "gestalt",
            Self::Levenshtein => "levenshtein",
            Self::JaroWinkler => "jaro_winkler",
        };
        f.write_str(name)
    }
}

/// Ratcliff/Obershelp similarity, `2 * M / T`.
///
/// `M` is found by taking the longest common block, then recursing into the
/// unmatched pieces on either side of it. Ties between equally long blocks
/// go to the one starting earliest in `a`, then earliest in `b`. Two empty
/// strings are identical.
pub fn gestalt_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_characters(&a, &b) as f64 / total as f64
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut positions: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, c) in b.iter().enumerate() {
        positions.entry(*c).or_default().push(j);
    }

    let mut pending = vec![(0, a.len(), 0, b.len())];
    let mut matched = 0;

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_block(a, &positions, (alo, ahi), (blo, bhi));
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]` as
/// `(start_in_a, start_in_b, len)`.
fn longest_block(
    a: &[char],
    positions: &HashMap<char, Vec<usize>>,
    (alo, ahi): (usize, usize),
    (blo, bhi): (usize, usize),
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
    // Length of the run ending at each position of `b`, for the previous row.
    let mut run_at: HashMap<usize, usize> = HashMap::new();

    for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next_run_at = HashMap::new();
        if let Some(js) = positions.get(c) {
            for &j in js {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let size = j
                    .checked_sub(1)
                    .and_then(|prev| run_at.get(&prev))
                    .copied()
                    .unwrap_or(0)
                    + 1;
                next_run_at.insert(j, size);
                if size > best_size {
                    best_i = i + 1 - size;
                    best_j = j + 1 - size;
                    best_size = size;
                }
            }
        }
        run_at = next_run_at;
    }

    (best_i, best_j, best_size)
}
