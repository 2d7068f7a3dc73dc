//! clipqa: clipboard question watcher
//!
//! Watches the clipboard for question text, looks it up in a JSON corpus of
//! question/answer pairs, and relays the best answers to a display process
//! over a small line protocol on loopback TCP.
//!
//! # Pieces
//!
//! - [`corpus`]: loading and validating the question store
//! - [`matcher`]: exact, substring, and fuzzy matching
//! - [`transport`]: wire protocol, client with retries, listener with restarts
//! - [`watch`]: the polling loop with its circuit breaker
//!
//! # Example
//!
//! ```ignore
//! use clipqa::{find_matches, Corpus};
//! use std::path::Path;
//!
//! let corpus = Corpus::load(Path::new("answers.json"))?;
//! for entry in find_matches(&corpus, "what is the capital of france") {
//!     println!("{}", entry.question);
//! }
//! ```

pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod shutdown;
pub mod transport;
pub mod watch;

pub use config::ClipQaConfig;
pub use corpus::{Answer, Corpus, QaEntry, RejectReason};
pub use error::{ClipQaError, Result};
pub use matcher::{find_matches, normalize, rank_candidates, Candidate, MatchTier};
pub use shutdown::Shutdown;
pub use transport::{
    ConnectionHealth, DisplaySink, JsonLinesSink, Message, MessageKind, ServerHandle, ServerPhase,
    TransportClient, TransportServer,
};
pub use watch::{CommandSource, Step, TextSource, WatchLoop, WatchStats};
