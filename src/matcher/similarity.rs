//! Sequence similarity ratio (Ratcliff/Obershelp "gestalt" matching)
//!
//! The ratio of two sequences is `2 * M / T`, where `T` is the total number
//! of characters in both and `M` is the number of characters covered by the
//! recursively found longest common blocks. 1.0 means identical, 0.0 means
//! nothing in common.
//!
//! The target (the text being searched for) is indexed once and compared
//! against many candidates. Long targets (200+ characters) treat very
//! frequent characters as "popular": they never seed a match, but can still
//! extend one.

use std::collections::HashMap;

/// Targets at least this long get popular-character pruning
const AUTOJUNK_MIN_LEN: usize = 200;

/// A target sequence prepared for repeated similarity checks
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    target: Vec<char>,
    /// char -> ascending positions in `target` (popular chars removed)
    positions: HashMap<char, Vec<usize>>,
    /// char -> number of occurrences in `target`
    counts: HashMap<char, usize>,
}

impl SimilarityIndex {
    pub fn new(target: &str) -> Self {
        let target: Vec<char> = target.chars().collect();

        let mut positions: HashMap<char, Vec<usize>> = HashMap::new();
        let mut counts: HashMap<char, usize> = HashMap::new();
        for (j, &c) in target.iter().enumerate() {
            positions.entry(c).or_default().push(j);
            *counts.entry(c).or_insert(0) += 1;
        }

        if target.len() >= AUTOJUNK_MIN_LEN {
            let threshold = target.len() / 100 + 1;
            positions.retain(|_, idxs| idxs.len() <= threshold);
        }

        Self {
            target,
            positions,
            counts,
        }
    }

    /// Full similarity ratio of `candidate` against the target
    pub fn ratio(&self, candidate: &str) -> f64 {
        let a: Vec<char> = candidate.chars().collect();
        calculate_ratio(self.matching_chars(&a), a.len() + self.target.len())
    }

    /// Upper bound on [`SimilarityIndex::ratio`] from lengths alone
    pub fn real_quick_ratio(&self, candidate_len: usize) -> f64 {
        let lb = self.target.len();
        calculate_ratio(candidate_len.min(lb), candidate_len + lb)
    }

    /// Upper bound on [`SimilarityIndex::ratio`] from character multisets
    pub fn quick_ratio(&self, candidate: &[char]) -> f64 {
        let mut available: HashMap<char, isize> = HashMap::new();
        let mut matches = 0;
        for c in candidate {
            let remaining = available
                .entry(*c)
                .or_insert_with(|| self.counts.get(c).copied().unwrap_or(0) as isize);
            if *remaining > 0 {
                matches += 1;
            }
            *remaining -= 1;
        }
        calculate_ratio(matches, candidate.len() + self.target.len())
    }

    /// Total characters covered by matching blocks between `a` and the target
    fn matching_chars(&self, a: &[char]) -> usize {
        let mut total = 0;
        let mut queue = vec![(0, a.len(), 0, self.target.len())];

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.longest_match(a, alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            total += k;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }

        total
    }

    /// Longest block `a[i..i+k] == target[j..j+k]` within the given windows.
    ///
    /// Ties go to the block starting earliest in `a`, then earliest in the
    /// target.
    fn longest_match(
        &self,
        a: &[char],
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let b = &self.target;
        let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);

        // j -> length of the match ending at (i - 1, j)
        let mut run_lengths: HashMap<usize, usize> = HashMap::new();
        for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
            let mut next_runs: HashMap<usize, usize> = HashMap::new();
            if let Some(js) = self.positions.get(c) {
                for &j in js {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| run_lengths.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_runs.insert(j, k);
                    if k > best_k {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_k = k;
                    }
                }
            }
            run_lengths = next_runs;
        }

        // Popular characters never seed a block, but may extend one.
        while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_k += 1;
        }
        while best_i + best_k < ahi && best_j + best_k < bhi && a[best_i + best_k] == b[best_j + best_k]
        {
            best_k += 1;
        }

        (best_i, best_j, best_k)
    }
}

fn calculate_ratio(matches: usize, length: usize) -> f64 {
    if length == 0 {
        return 1.0;
    }
    2.0 * matches as f64 / length as f64
}

/// Best `limit` candidates whose ratio against `word` is at least `cutoff`.
///
/// Results are ordered by ratio, highest first; equal ratios are ordered by
/// the candidate text in descending order.
pub fn close_matches<'a, I>(word: &str, candidates: I, limit: usize, cutoff: f64) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    if limit == 0 {
        return Vec::new();
    }

    let index = SimilarityIndex::new(word);
    let mut scored: Vec<(f64, &'a str)> = Vec::new();

    for candidate in candidates {
        let chars: Vec<char> = candidate.chars().collect();
        if index.real_quick_ratio(chars.len()) < cutoff || index.quick_ratio(&chars) < cutoff {
            continue;
        }
        let score = index.ratio(candidate);
        if score >= cutoff {
            scored.push((score, candidate));
        }
    }

    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| b.1.cmp(a.1)));
    scored.into_iter().take(limit).map(|(_, c)| c).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratio(a: &str, b: &str) -> f64 {
        SimilarityIndex::new(b).ratio(a)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_ratio_basic() {
        assert!(approx(ratio("abcd", "bcde"), 0.75));
        assert!(approx(ratio("same", "same"), 1.0));
        assert!(approx(ratio("abc", "xyz"), 0.0));
        assert!(approx(ratio("", ""), 1.0));
    }

    #[test]
    fn test_ratio_recurses_into_both_sides() {
        // "ab" and "de" are matched around the shared "c"
        assert!(approx(ratio("abXcdY", "abcd"), 0.8));
    }

    #[test]
    fn test_quick_ratios_bound_full_ratio() {
        let index = SimilarityIndex::new("what is the capital");
        let candidate = "capital of what";
        let chars: Vec<char> = candidate.chars().collect();
        let full = index.ratio(candidate);
        assert!(index.quick_ratio(&chars) >= full);
        assert!(index.real_quick_ratio(chars.len()) >= index.quick_ratio(&chars));
    }

    #[test]
    fn test_close_matches_orders_by_ratio() {
        let words = ["ape", "apple", "peach", "puppy"];
        assert_eq!(close_matches("appel", words, 3, 0.6), vec!["apple", "ape"]);
    }

    #[test]
    fn test_close_matches_respects_limit_and_cutoff() {
        let words = ["abcd", "abce", "abcf", "abcg", "zzzz"];
        let matches = close_matches("abcx", words, 3, 0.6);
        assert_eq!(matches.len(), 3);
        assert!(!matches.contains(&"zzzz"));
        // equal ratios fall back to descending text order
        assert_eq!(matches, vec!["abcg", "abcf", "abce"]);
    }

    #[test]
    fn test_long_target_still_matches_itself() {
        let long = "the quick brown fox jumps over the lazy dog ".repeat(6);
        assert!(long.chars().count() >= AUTOJUNK_MIN_LEN);
        assert!(approx(ratio(&long, &long), 1.0));
    }
}
