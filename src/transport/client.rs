//! Sending side of the display protocol
//!
//! Every message opens its own connection, writes the encoded text, and
//! closes. Failed attempts are retried with a linear backoff
//! (`attempt * backoff_step`), and the outcome is folded into
//! [`ConnectionHealth`], which the watch loop reads for its circuit breaker.

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::config::TransportConfig;
use crate::corpus::QaEntry;
use crate::shutdown::Shutdown;

use super::protocol::Message;

/// Questions longer than this are cut before sending
pub const QUESTION_PREVIEW_CHARS: usize = 80;

/// Answers taken from an entry's `answers` list
pub const ANSWERS_PER_ENTRY: usize = 3;

/// Leading marker on every answer line
pub const ANSWER_MARKER: &str = "➤ ";

pub const NO_MATCH_QUESTION: &str = "New question";
pub const NO_MATCH_ANSWER: &str = "❌ No answer found";

/// Delivers raw bytes to an endpoint in a single short-lived connection
pub trait Dialer: Send + Sync {
    fn deliver(
        &self,
        endpoint: &str,
        payload: &[u8],
        timeout: Duration,
    ) -> impl Future<Output = io::Result<()>> + Send;
}

/// TCP connection per message
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer;

impl Dialer for TcpDialer {
    async fn deliver(&self, endpoint: &str, payload: &[u8], timeout: Duration) -> io::Result<()> {
        let exchange = async {
            let mut stream = TcpStream::connect(endpoint).await?;
            stream.write_all(payload).await?;
            stream.shutdown().await
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no response from {} within {:?}", endpoint, timeout),
            )),
        }
    }
}

/// Sender-side view of the display connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionHealth {
    pub alive: bool,
    pub consecutive_errors: u32,
}

impl ConnectionHealth {
    fn record_success(&mut self) {
        self.alive = true;
        self.consecutive_errors = 0;
    }

    fn record_failure(&mut self) {
        self.alive = false;
        self.consecutive_errors += 1;
    }
}

/// Retry state for a single message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SendState {
    /// Open a connection and write (1-based attempt)
    Attempt(u32),
    /// Wait before the next attempt
    Backoff(u32),
    Delivered,
    Exhausted,
    /// Shutdown arrived; no further attempts
    Cancelled,
}

/// Client for the display process
pub struct TransportClient<D = TcpDialer> {
    endpoint: String,
    config: TransportConfig,
    dialer: D,
    health: ConnectionHealth,
    shutdown: Shutdown,
}

impl TransportClient<TcpDialer> {
    pub fn new(config: TransportConfig, shutdown: Shutdown) -> Self {
        Self::with_dialer(config, TcpDialer, shutdown)
    }
}

impl<D: Dialer> TransportClient<D> {
    pub fn with_dialer(config: TransportConfig, dialer: D, shutdown: Shutdown) -> Self {
        Self {
            endpoint: config.endpoint(),
            config,
            dialer,
            health: ConnectionHealth::default(),
            shutdown,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn health(&self) -> ConnectionHealth {
        self.health
    }

    /// Forget accumulated errors after the circuit breaker pause
    pub fn clear_errors(&mut self) {
        self.health.consecutive_errors = 0;
    }

    /// Count a failure that happened outside of a send
    pub fn note_failure(&mut self) {
        self.health.record_failure();
    }

    /// Send with the configured number of attempts
    pub async fn send(&mut self, message: &Message) -> bool {
        self.send_with_retries(message, self.config.max_retries).await
    }

    /// Send a message, retrying up to `max_retries` attempts in total.
    ///
    /// Never fails loudly: the result is `false` and the health counters
    /// carry the failure.
    pub async fn send_with_retries(&mut self, message: &Message, max_retries: u32) -> bool {
        let max_attempts = max_retries.max(1);
        let payload = message.encode();
        let mut state = SendState::Attempt(1);

        loop {
            state = match state {
                SendState::Attempt(attempt) => {
                    if self.shutdown.is_triggered() {
                        SendState::Cancelled
                    } else {
                        match self
                            .dialer
                            .deliver(&self.endpoint, payload.as_bytes(), self.config.send_timeout())
                            .await
                        {
                            Ok(()) => SendState::Delivered,
                            Err(e) => {
                                self.log_failure(attempt, &e);
                                if attempt < max_attempts {
                                    SendState::Backoff(attempt)
                                } else {
                                    SendState::Exhausted
                                }
                            }
                        }
                    }
                }
                SendState::Backoff(attempt) => {
                    let wait = self.config.backoff_step() * attempt;
                    if self.shutdown.sleep(wait).await {
                        SendState::Cancelled
                    } else {
                        SendState::Attempt(attempt + 1)
                    }
                }
                SendState::Delivered => {
                    self.health.record_success();
                    return true;
                }
                SendState::Exhausted => {
                    self.health.record_failure();
                    tracing::debug!(
                        "Giving up on {} after {} attempts ({} consecutive errors)",
                        message.kind(),
                        max_attempts,
                        self.health.consecutive_errors
                    );
                    return false;
                }
                SendState::Cancelled => return false,
            };
        }
    }

    fn log_failure(&mut self, attempt: u32, error: &io::Error) {
        match error.kind() {
            io::ErrorKind::TimedOut => {
                tracing::warn!("Socket timeout (attempt {})", attempt);
            }
            io::ErrorKind::ConnectionRefused => {
                self.health.alive = false;
                if attempt == 1 {
                    tracing::warn!("Display not reachable at {}", self.endpoint);
                }
            }
            _ => {
                tracing::warn!("Socket error (attempt {}): {}", attempt, error);
            }
        }
    }

    /// Probe the display with a single PING; leaves the error counter alone
    pub async fn test_connection(&mut self) -> bool {
        if self.shutdown.is_triggered() {
            return false;
        }
        let payload = Message::Ping.encode();
        let reachable = self
            .dialer
            .deliver(&self.endpoint, payload.as_bytes(), self.config.probe_timeout())
            .await
            .is_ok();
        self.health.alive = reachable;
        tracing::debug!("Display probe: {}", if reachable { "up" } else { "down" });
        reachable
    }

    /// Send CLEAR, the question, and every answer of the matched entries.
    ///
    /// A failed CLEAR or QUESTION aborts; a failed ANSWER is skipped.
    /// Returns `true` when at least one answer line was delivered.
    pub async fn send_conversation(&mut self, question: &str, matches: &[&QaEntry]) -> bool {
        if !self.send(&Message::Clear).await {
            return false;
        }
        if self.shutdown.sleep(self.config.clear_settle()).await {
            return false;
        }
        if !self.send(&Message::Question(preview_question(question))).await {
            return false;
        }

        let mut delivered = 0;
        for entry in matches {
            for line in entry.answer_lines(ANSWERS_PER_ENTRY) {
                let message = Message::Answer(format!("{}{}", ANSWER_MARKER, line));
                if self.send(&message).await {
                    delivered += 1;
                }
            }
        }

        tracing::info!("{} answer(s) sent", delivered);
        delivered > 0
    }

    /// Tell the display nothing matched
    pub async fn send_no_match(&mut self) -> bool {
        if !self.send(&Message::Clear).await {
            return false;
        }
        if !self
            .send(&Message::Question(NO_MATCH_QUESTION.to_string()))
            .await
        {
            return false;
        }
        self.send(&Message::Answer(NO_MATCH_ANSWER.to_string()))
            .await
    }
}

/// Cut a question to [`QUESTION_PREVIEW_CHARS`] characters plus `...`
pub fn preview_question(question: &str) -> String {
    if question.chars().count() > QUESTION_PREVIEW_CHARS {
        let head: String = question.chars().take(QUESTION_PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        question.to_string()
    }
}
