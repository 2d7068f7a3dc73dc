//! Error types and exit codes for clipqa

use std::process::ExitCode;
use thiserror::Error;

/// Main error type for clipqa operations
#[derive(Error, Debug)]
pub enum ClipQaError {
    #[error("Corpus file not found: {path}")]
    CorpusNotFound { path: String },

    #[error("Corpus file is empty: {path}")]
    CorpusEmpty { path: String },

    #[error("Failed to parse corpus {path}: {source}")]
    CorpusParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Corpus does not contain a non-empty list of questions")]
    CorpusNotAList,

    #[error("No valid questions in corpus ({total} records checked)")]
    NoValidEntries { total: usize },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Clipboard tool unavailable: {tool}")]
    ClipboardUnavailable { tool: String },

    #[error("Failed to bind display server on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClipQaError {
    /// Convert error to a process exit code:
    /// - 0: Success
    /// - 1: IO / configuration error
    /// - 2: Corpus could not be loaded
    /// - 3: Clipboard capability missing
    /// - 4: Display server could not bind
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }

    /// Raw exit status backing [`ClipQaError::exit_code`]
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::Io(_) | Self::Config { .. } => 1,
            Self::CorpusNotFound { .. }
            | Self::CorpusEmpty { .. }
            | Self::CorpusParse { .. }
            | Self::CorpusNotAList
            | Self::NoValidEntries { .. } => 2,
            Self::ClipboardUnavailable { .. } => 3,
            Self::Bind { .. } => 4,
        }
    }

    /// Whether this error came from loading the corpus
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::CorpusNotFound { .. }
                | Self::CorpusEmpty { .. }
                | Self::CorpusParse { .. }
                | Self::CorpusNotAList
                | Self::NoValidEntries { .. }
        )
    }
}

/// Result type alias for clipqa operations
pub type Result<T> = std::result::Result<T, ClipQaError>;
