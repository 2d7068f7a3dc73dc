//! Clipboard watch loop
//!
//! Polls a [`TextSource`], matches new snippets against the corpus, and
//! relays the result to the display through a [`TransportClient`].
//!
//! # Iteration
//!
//! 1. Circuit breaker: `max_errors` consecutive transport errors pause
//!    ingestion for `error_pause`, then the counter is cleared.
//! 2. Every `probe_interval`, PING the display.
//! 3. Read the source; `None` ends the loop. An empty read is skipped
//!    without touching the last seen text.
//! 4. Unchanged text is ignored.
//! 5. Text shorter than `min_snippet_chars` is remembered, not matched.
//! 6. Match and send a conversation (or the "no answer" conversation).
//! 7. Remember the text.
//! 8. Sleep `poll_interval`.
//!
//! Every sleep is cut short by the shutdown signal.

pub mod source;

use tokio::time::Instant;

use crate::config::WatchConfig;
use crate::corpus::Corpus;
use crate::error::{ClipQaError, Result};
use crate::matcher;
use crate::shutdown::Shutdown;
use crate::transport::{Dialer, TcpDialer, TransportClient};

pub use source::{CommandSource, TextSource};

/// What one iteration did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Circuit breaker pause ran
    Paused,
    /// Source is gone for good
    Unavailable,
    /// Source returned no text (failed read or empty clipboard)
    Empty,
    Unchanged,
    TooShort,
    Answered { matches: usize, delivered: bool },
    NoMatch { delivered: bool },
}

/// Counters reported when the loop ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchStats {
    pub iterations: u64,
    pub snippets: u64,
    pub conversations_delivered: u64,
    pub pauses: u64,
    pub unexpected_errors: u64,
}

pub struct WatchLoop<S: TextSource, D: Dialer = TcpDialer> {
    corpus: Corpus,
    source: S,
    client: TransportClient<D>,
    config: WatchConfig,
    shutdown: Shutdown,
    last_seen: String,
    last_probe: Instant,
    stats: WatchStats,
}

impl<S: TextSource, D: Dialer> WatchLoop<S, D> {
    pub fn new(
        corpus: Corpus,
        source: S,
        client: TransportClient<D>,
        config: WatchConfig,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            corpus,
            source,
            client,
            config,
            shutdown,
            last_seen: String::new(),
            last_probe: Instant::now(),
            stats: WatchStats::default(),
        }
    }

    /// Consecutive transport errors, as seen by the circuit breaker
    pub fn error_count(&self) -> u32 {
        self.client.health().consecutive_errors
    }

    pub fn client(&self) -> &TransportClient<D> {
        &self.client
    }

    pub fn stats(&self) -> WatchStats {
        self.stats
    }

    pub fn last_seen(&self) -> &str {
        &self.last_seen
    }

    /// Run until shutdown or until the source disappears.
    ///
    /// Losing the source is reported as [`ClipQaError::ClipboardUnavailable`].
    pub async fn run(&mut self) -> Result<WatchStats> {
        tracing::info!(
            "Clipboard monitoring started ({} questions, display at {})",
            self.corpus.len(),
            self.client.endpoint()
        );

        let mut outcome = Ok(());
        while !self.shutdown.is_triggered() {
            match self.step().await {
                Ok(Step::Unavailable) => {
                    tracing::error!("{} unavailable - stopping", self.source.describe());
                    outcome = Err(ClipQaError::ClipboardUnavailable {
                        tool: self.source.describe(),
                    });
                    break;
                }
                Ok(Step::Paused) => continue,
                Ok(_) => {}
                Err(e) => {
                    self.stats.unexpected_errors += 1;
                    self.client.note_failure();
                    tracing::error!("Unexpected error: {}", e);
                    if self.shutdown.sleep(self.config.error_backoff()).await {
                        break;
                    }
                    continue;
                }
            }

            if self.shutdown.sleep(self.config.poll_interval()).await {
                break;
            }
        }

        let stats = self.stats;
        tracing::info!(
            "Clipboard monitoring stopped: {} checks, {} snippets, {} delivered, {} pauses, {} errors",
            stats.iterations,
            stats.snippets,
            stats.conversations_delivered,
            stats.pauses,
            self.error_count()
        );
        outcome.map(|()| stats)
    }

    /// One pass of the loop, without the trailing poll sleep
    pub async fn step(&mut self) -> Result<Step> {
        self.stats.iterations += 1;

        let errors = self.error_count();
        if errors >= self.config.max_errors {
            tracing::warn!(
                "Too many errors ({}) - pausing {}s",
                errors,
                self.config.error_pause_secs
            );
            self.stats.pauses += 1;
            if !self.shutdown.sleep(self.config.error_pause()).await {
                self.client.clear_errors();
            }
            return Ok(Step::Paused);
        }

        if self.last_probe.elapsed() >= self.config.probe_interval() {
            self.client.test_connection().await;
            self.last_probe = Instant::now();
        }

        let Some(text) = self.source.read_current_text().await? else {
            return Ok(Step::Unavailable);
        };

        if text.is_empty() {
            return Ok(Step::Empty);
        }

        if text == self.last_seen {
            return Ok(Step::Unchanged);
        }

        if text.trim().chars().count() < self.config.min_snippet_chars {
            tracing::debug!("Text too short: {} chars", text.chars().count());
            self.last_seen = text;
            return Ok(Step::TooShort);
        }

        self.stats.snippets += 1;
        let preview: String = text.chars().take(50).collect();
        tracing::info!("New question: \"{}...\"", preview);

        let matches = matcher::find_matches(&self.corpus, &text);
        let step = if matches.is_empty() {
            let delivered = self.client.send_no_match().await;
            tracing::info!("No matching answer found");
            Step::NoMatch { delivered }
        } else {
            let delivered = self.client.send_conversation(&text, &matches).await;
            if delivered {
                tracing::info!("{} match(es) sent", matches.len());
            } else {
                tracing::warn!("Failed to send answers");
            }
            Step::Answered {
                matches: matches.len(),
                delivered,
            }
        };

        if matches!(
            step,
            Step::Answered { delivered: true, .. } | Step::NoMatch { delivered: true }
        ) {
            self.stats.conversations_delivered += 1;
        }

        self.last_seen = text;
        Ok(step)
    }
}
