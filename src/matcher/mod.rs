//! Snippet to answer matching
//!
//! Matching runs three tiers in order and stops at the first tier that
//! produces anything:
//!
//! | Tier | Rule | Score |
//! |------|------|-------|
//! | Exact | normalized question == normalized snippet | 100 |
//! | Substring | one normalized text contains the other | `80 * shorter / longer` |
//! | Fuzzy | similarity ratio >= 0.6 on the raw texts, best 3 | 60 |
//!
//! Candidates are stable-sorted by score and cut to [`MAX_RESULTS`].

pub mod similarity;

use crate::corpus::{Corpus, QaEntry};

/// Snippets shorter than this (after trimming) are treated as noise
pub const MIN_SNIPPET_CHARS: usize = 3;

/// Upper bound on entries returned by [`find_matches`]
pub const MAX_RESULTS: usize = 5;

const EXACT_SCORE: f64 = 100.0;
const SUBSTRING_WEIGHT: f64 = 80.0;
const FUZZY_SCORE: f64 = 60.0;
const FUZZY_LIMIT: usize = 3;
const FUZZY_CUTOFF: f64 = 0.6;

/// Which matching strategy produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    Exact,
    Substring,
    Fuzzy,
}

/// A scored corpus entry
#[derive(Debug, Clone)]
pub struct Candidate<'c> {
    pub entry: &'c QaEntry,
    pub score: f64,
    pub tier: MatchTier,
}

/// Lowercase, trim, and collapse whitespace runs to single spaces
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Best matching entries for a snippet, at most [`MAX_RESULTS`]
pub fn find_matches<'c>(corpus: &'c Corpus, snippet: &str) -> Vec<&'c QaEntry> {
    rank_candidates(corpus.entries(), snippet)
        .into_iter()
        .map(|candidate| candidate.entry)
        .collect()
}

/// Scored candidates for a snippet, highest score first, at most [`MAX_RESULTS`]
pub fn rank_candidates<'c>(entries: &'c [QaEntry], snippet: &str) -> Vec<Candidate<'c>> {
    if snippet.trim().chars().count() < MIN_SNIPPET_CHARS {
        return Vec::new();
    }

    let needle = normalize(snippet);
    if needle.is_empty() {
        return Vec::new();
    }

    let mut found = exact_tier(entries, &needle);
    if found.is_empty() {
        found = substring_tier(entries, &needle);
    }
    if found.is_empty() {
        found = fuzzy_tier(entries, snippet);
    }

    found.sort_by(|a, b| b.score.total_cmp(&a.score));
    found.truncate(MAX_RESULTS);
    found
}

fn exact_tier<'c>(entries: &'c [QaEntry], needle: &str) -> Vec<Candidate<'c>> {
    entries
        .iter()
        .filter(|entry| normalize(&entry.question) == needle)
        .map(|entry| Candidate {
            entry,
            score: EXACT_SCORE,
            tier: MatchTier::Exact,
        })
        .collect()
}

fn substring_tier<'c>(entries: &'c [QaEntry], needle: &str) -> Vec<Candidate<'c>> {
    let needle_len = needle.chars().count();

    entries
        .iter()
        .filter_map(|entry| {
            let question = normalize(&entry.question);
            if question.is_empty() || !(question.contains(needle) || needle.contains(&question)) {
                return None;
            }
            let question_len = question.chars().count();
            let coverage =
                needle_len.min(question_len) as f64 / needle_len.max(question_len) as f64;
            Some(Candidate {
                entry,
                score: SUBSTRING_WEIGHT * coverage,
                tier: MatchTier::Substring,
            })
        })
        .collect()
}

fn fuzzy_tier<'c>(entries: &'c [QaEntry], snippet: &str) -> Vec<Candidate<'c>> {
    // Identical questions would map back to the same first entry.
    let mut questions: Vec<&str> = Vec::with_capacity(entries.len());
    for entry in entries {
        if !questions.contains(&entry.question.as_str()) {
            questions.push(&entry.question);
        }
    }

    similarity::close_matches(snippet, questions, FUZZY_LIMIT, FUZZY_CUTOFF)
        .into_iter()
        .filter_map(|question| entries.iter().find(|entry| entry.question == question))
        .map(|entry| Candidate {
            entry,
            score: FUZZY_SCORE,
            tier: MatchTier::Fuzzy,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(entries: Vec<QaEntry>) -> Corpus {
        Corpus::from_entries(entries)
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  What   IS\t2+2? \n"), "what is 2+2?");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \t "), "");
    }

    #[test]
    fn test_normalize_idempotent() {
        for text in ["  Mixed CASE\ttext ", "ÄÖÜ  straße", "a\u{3000}b", "already normal"] {
            let once = normalize(text);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_short_snippet_returns_nothing() {
        let corpus = corpus(vec![QaEntry::single("ab", "x")]);
        assert!(find_matches(&corpus, "ab").is_empty());
        assert!(find_matches(&corpus, "  ab   ").is_empty());
        assert!(find_matches(&corpus, "").is_empty());
    }

    #[test]
    fn test_exact_match() {
        let corpus = corpus(vec![QaEntry::single("What is 2+2?", "4")]);
        let matches = find_matches(&corpus, "what is 2+2?");
        assert_eq!(matches, vec![&QaEntry::single("What is 2+2?", "4")]);
    }

    #[test]
    fn test_exact_tier_dominates() {
        let corpus = corpus(vec![
            QaEntry::single("capital of france", "Paris"),
            QaEntry::single("Capital of France", "Paris, again"),
            QaEntry::single("what is the capital of france today", "Still Paris"),
        ]);
        let ranked = rank_candidates(corpus.entries(), "capital  of FRANCE");
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|c| c.tier == MatchTier::Exact && c.score == 100.0));
    }

    #[test]
    fn test_substring_match() {
        let corpus = corpus(vec![QaEntry::single("capital of France", "Paris")]);
        let ranked = rank_candidates(corpus.entries(), "the capital of France is what");
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].tier, MatchTier::Substring);
        let expected = 80.0 * 17.0 / 29.0;
        assert!((ranked[0].score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_substring_prefers_closer_length() {
        let corpus = corpus(vec![
            QaEntry::single("france", "short"),
            QaEntry::single("capital of france", "closer"),
        ]);
        let matches = find_matches(&corpus, "the capital of france");
        assert_eq!(matches[0].question, "capital of france");
        assert_eq!(matches[1].question, "france");
    }

    #[test]
    fn test_fuzzy_match() {
        let corpus = corpus(vec![
            QaEntry::single("What is the boiling point of water?", "100 C"),
            QaEntry::single("Who wrote Faust?", "Goethe"),
        ]);
        let ranked = rank_candidates(corpus.entries(), "What is the boiling pont of watr?");
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].tier, MatchTier::Fuzzy);
        assert_eq!(ranked[0].entry.answer_lines(3), vec!["100 C"]);
    }

    #[test]
    fn test_fuzzy_duplicate_questions_yield_one_entry() {
        let corpus = corpus(vec![
            QaEntry::single("Who painted the Mona Lisa?", "da Vinci"),
            QaEntry::single("Who painted the Mona Lisa?", "Leonardo"),
        ]);
        let matches = find_matches(&corpus, "Who paintd the Mona Lisa");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].answer_lines(3), vec!["da Vinci"]);
    }

    #[test]
    fn test_no_match() {
        let corpus = corpus(vec![QaEntry::single("What is 2+2?", "4")]);
        assert!(find_matches(&corpus, "completely unrelated clipboard text").is_empty());
    }

    #[test]
    fn test_result_cap() {
        let entries: Vec<QaEntry> = (0..12)
            .map(|i| QaEntry::single(format!("question {}", i), "a"))
            .collect();
        let corpus = corpus(entries);
        let matches = find_matches(&corpus, "question");
        assert_eq!(matches.len(), MAX_RESULTS);
        // all ties: discovery order is kept
        assert_eq!(matches[0].question, "question 0");
        assert_eq!(matches[4].question, "question 4");
    }
}
