//! Loading question files from disk

mod common;

use clipqa::{find_matches, ClipQaError, Corpus, RejectReason};
use common::{TestWorkspace, SAMPLE_CORPUS};

#[test]
fn test_load_sample_corpus() {
    let ws = TestWorkspace::new();
    let path = ws.add_corpus(SAMPLE_CORPUS);

    let corpus = Corpus::load(&path).unwrap();
    assert_eq!(corpus.len(), 3);
    assert!(corpus.rejected().is_empty());
}

#[test]
fn test_empty_question_rejected_but_load_succeeds() {
    let ws = TestWorkspace::new();
    let path = ws.add_corpus(
        r#"[{"question": ""}, {"question": "What is 2+2?", "answer": "4"}]"#,
    );

    let corpus = Corpus::load(&path).unwrap();
    assert_eq!(corpus.len(), 1);
    assert_eq!(corpus.total_records(), 2);
    assert_eq!(corpus.rejected()[0].index, 0);
    assert_eq!(corpus.rejected()[0].reason, RejectReason::InvalidQuestion);
}

#[test]
fn test_only_invalid_entry_fails_load() {
    let ws = TestWorkspace::new();
    let path = ws.add_corpus(r#"[{"question": ""}]"#);

    let err = Corpus::load(&path).unwrap_err();
    assert!(matches!(err, ClipQaError::NoValidEntries { total: 1 }));
    assert_eq!(err.exit_status(), 2);
}

#[test]
fn test_missing_and_malformed_files() {
    let ws = TestWorkspace::new();

    let missing = Corpus::load(&ws.path().join("nope.json")).unwrap_err();
    assert!(matches!(missing, ClipQaError::CorpusNotFound { .. }));

    let empty = ws.add_file("empty.json", "   ");
    assert!(matches!(
        Corpus::load(&empty).unwrap_err(),
        ClipQaError::CorpusEmpty { .. }
    ));

    let broken = ws.add_file("broken.json", "[{\"question\": ");
    assert!(matches!(
        Corpus::load(&broken).unwrap_err(),
        ClipQaError::CorpusParse { .. }
    ));

    let object = ws.add_file("object.json", r#"{"question": "q", "answer": "a"}"#);
    assert!(matches!(
        Corpus::load(&object).unwrap_err(),
        ClipQaError::CorpusNotAList
    ));
}

#[test]
fn test_loaded_corpus_matches_all_tiers() {
    let ws = TestWorkspace::new();
    let corpus = Corpus::load(&ws.add_corpus(SAMPLE_CORPUS)).unwrap();

    let exact = find_matches(&corpus, "  WHAT is   2+2? ");
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].question, "What is 2+2?");

    let substring = find_matches(&corpus, "the capital of France is what");
    assert_eq!(substring[0].question, "capital of France");

    let fuzzy = find_matches(&corpus, "primary colors");
    assert_eq!(fuzzy[0].question, "primary colours");

    assert!(find_matches(&corpus, "ab").is_empty());
}
