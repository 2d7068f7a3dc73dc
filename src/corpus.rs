//! Question/answer corpus loading and validation
//!
//! The corpus is a JSON list of records:
//!
//! ```json
//! [
//!   {"question": "What is 2+2?", "answer": "4"},
//!   {"question": "Primary colours", "answers": ["red", "green", "blue"]}
//! ]
//! ```
//!
//! Loading is all-or-nothing: the file must exist, be non-empty, parse, and
//! yield at least one valid record. Individual bad records are skipped and
//! reported, never fatal.

use std::fmt;
use std::path::Path;

use serde_json::Value;

use crate::error::{ClipQaError, Result};

/// The answer side of a corpus record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// `"answer": "..."`
    Single(String),
    /// `"answers": ["...", ...]`
    Many(Vec<String>),
}

/// One validated corpus record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaEntry {
    pub question: String,
    pub answer: Answer,
}

impl QaEntry {
    pub fn single(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: Answer::Single(answer.into()),
        }
    }

    pub fn many<I, S>(question: impl Into<String>, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            question: question.into(),
            answer: Answer::Many(answers.into_iter().map(Into::into).collect()),
        }
    }

    /// Answer lines to display for this entry, at most `limit` from a list
    pub fn answer_lines(&self, limit: usize) -> Vec<&str> {
        match &self.answer {
            Answer::Single(answer) => vec![answer.as_str()],
            Answer::Many(answers) => answers.iter().take(limit).map(String::as_str).collect(),
        }
    }
}

/// Why a record was skipped during load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    NotAnObject,
    MissingQuestion,
    InvalidQuestion,
    NoUsableAnswer,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NotAnObject => "is not an object",
            Self::MissingQuestion => "has no 'question'",
            Self::InvalidQuestion => "has an empty or non-string 'question'",
            Self::NoUsableAnswer => "has no usable 'answer' or 'answers'",
        };
        f.write_str(text)
    }
}

/// A skipped record and its position in the source list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    pub index: usize,
    pub reason: RejectReason,
}

/// The loaded, immutable question store
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    entries: Vec<QaEntry>,
    rejected: Vec<Rejected>,
}

impl Corpus {
    /// Build a corpus directly from validated entries
    pub fn from_entries(entries: Vec<QaEntry>) -> Self {
        Self {
            entries,
            rejected: Vec::new(),
        }
    }

    /// Load and validate a corpus file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ClipQaError::CorpusNotFound {
                path: path.display().to_string(),
            });
        }

        let text = std::fs::read_to_string(path)?;
        if text.trim().is_empty() {
            return Err(ClipQaError::CorpusEmpty {
                path: path.display().to_string(),
            });
        }

        let value: Value =
            serde_json::from_str(&text).map_err(|source| ClipQaError::CorpusParse {
                path: path.display().to_string(),
                source,
            })?;

        let corpus = Self::from_value(&value)?;
        tracing::info!(
            "{} records loaded from {} ({} valid)",
            corpus.total_records(),
            path.display(),
            corpus.len()
        );
        Ok(corpus)
    }

    /// Validate an already-parsed JSON document
    pub fn from_value(value: &Value) -> Result<Self> {
        let records = match value.as_array() {
            Some(records) if !records.is_empty() => records,
            _ => return Err(ClipQaError::CorpusNotAList),
        };

        let mut entries = Vec::with_capacity(records.len());
        let mut rejected = Vec::new();

        for (index, record) in records.iter().enumerate() {
            match validate(record) {
                Ok(entry) => entries.push(entry),
                Err(reason) => {
                    tracing::warn!("Record {} {}", index, reason);
                    rejected.push(Rejected { index, reason });
                }
            }
        }

        if entries.is_empty() {
            return Err(ClipQaError::NoValidEntries {
                total: records.len(),
            });
        }

        Ok(Self { entries, rejected })
    }

    pub fn entries(&self) -> &[QaEntry] {
        &self.entries
    }

    pub fn rejected(&self) -> &[Rejected] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of records in the source, valid or not
    pub fn total_records(&self) -> usize {
        self.entries.len() + self.rejected.len()
    }
}

/// Validate a single record.
///
/// A non-empty string `answer` wins over `answers`; a list is only usable
/// when every element is a non-blank string.
pub fn validate(record: &Value) -> std::result::Result<QaEntry, RejectReason> {
    let object = record.as_object().ok_or(RejectReason::NotAnObject)?;

    let question = object
        .get("question")
        .ok_or(RejectReason::MissingQuestion)?
        .as_str()
        .filter(|q| !q.trim().is_empty())
        .ok_or(RejectReason::InvalidQuestion)?;

    if let Some(answer) = object
        .get("answer")
        .and_then(Value::as_str)
        .filter(|a| !a.trim().is_empty())
    {
        return Ok(QaEntry::single(question, answer));
    }

    let answers = object
        .get("answers")
        .and_then(Value::as_array)
        .filter(|list| !list.is_empty())
        .ok_or(RejectReason::NoUsableAnswer)?;

    let answers = answers
        .iter()
        .map(|a| a.as_str().filter(|s| !s.trim().is_empty()))
        .collect::<Option<Vec<&str>>>()
        .ok_or(RejectReason::NoUsableAnswer)?;

    Ok(QaEntry::many(question, answers))
}
