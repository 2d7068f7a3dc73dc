//! Receiving side of the display protocol
//!
//! # Lifecycle
//!
//! ```text
//! Stopped ─► Starting ─► Listening ─► Accepting ⇄ Handling
//!               ▲                          │
//!               └──── wait min(n*2, 10)s ◄─┘ accept/bind error (n <= 5)
//!
//! shutdown ─► Stopping ─► Stopped
//! ```
//!
//! Each connection carries exactly one message and is handled to completion
//! before the next accept. Accepts are bounded by a timeout so the shutdown
//! signal is observed between connections.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Instant;

use crate::config::ServerConfig;
use crate::error::{ClipQaError, Result};
use crate::shutdown::Shutdown;

use super::protocol::Message;
use super::sink::DisplaySink;

/// Where the server is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerPhase {
    Stopped,
    Starting,
    Listening,
    Accepting,
    Handling,
    Stopping,
}

/// Restart bookkeeping across listener failures.
///
/// Only a handled connection resets the count, so a listener that binds
/// and then fails every accept still reaches the ceiling.
#[derive(Debug, Clone)]
struct RestartPolicy {
    restarts: u32,
    config: ServerConfig,
}

impl RestartPolicy {
    fn new(config: &ServerConfig) -> Self {
        Self {
            restarts: 0,
            config: config.clone(),
        }
    }

    /// Count a failure: the wait before the next start, or `None` to give up
    fn record_failure(&mut self) -> Option<Duration> {
        self.restarts += 1;
        if self.restarts >= self.config.max_restarts {
            None
        } else {
            Some(self.config.restart_wait(self.restarts))
        }
    }

    fn record_success(&mut self) {
        self.restarts = 0;
    }

    fn attempts(&self) -> u32 {
        self.restarts
    }
}

/// Why the listener stopped serving
enum ListenerExit {
    Shutdown,
    Failed(ClipQaError),
}

/// Read-only view of a running server
#[derive(Debug, Clone)]
pub struct ServerHandle {
    phase: Arc<Mutex<ServerPhase>>,
    local_addr: Arc<Mutex<Option<SocketAddr>>>,
}

impl ServerHandle {
    pub fn phase(&self) -> ServerPhase {
        *self.phase.lock()
    }

    /// Address of the bound listener, once bound
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }
}

/// Display-side listener that forwards messages to a [`DisplaySink`]
pub struct TransportServer<S: DisplaySink> {
    addr: String,
    config: ServerConfig,
    sink: Arc<S>,
    shutdown: Shutdown,
    handle: ServerHandle,
    reported_alive: bool,
}

impl<S: DisplaySink> TransportServer<S> {
    pub fn new(addr: impl Into<String>, config: ServerConfig, sink: Arc<S>, shutdown: Shutdown) -> Self {
        Self {
            addr: addr.into(),
            config,
            sink,
            shutdown,
            handle: ServerHandle {
                phase: Arc::new(Mutex::new(ServerPhase::Stopped)),
                local_addr: Arc::new(Mutex::new(None)),
            },
            reported_alive: false,
        }
    }

    pub fn handle(&self) -> ServerHandle {
        self.handle.clone()
    }

    fn set_phase(&self, phase: ServerPhase) {
        *self.handle.phase.lock() = phase;
    }

    fn report(&mut self, alive: bool) {
        self.reported_alive = alive;
        self.sink.on_connection_status(alive);
    }

    /// Serve until shutdown or until the restart ceiling is hit.
    ///
    /// Returns the last error when the server gave up.
    pub async fn run(mut self) -> Result<()> {
        let mut policy = RestartPolicy::new(&self.config);
        let mut outcome = Ok(());

        while !self.shutdown.is_triggered() {
            self.set_phase(ServerPhase::Starting);

            let error = match self.bind().await {
                Ok(listener) => match self.serve(&listener, &mut policy).await {
                    ListenerExit::Shutdown => break,
                    ListenerExit::Failed(e) => e,
                },
                Err(e) => e,
            };

            let wait = policy.record_failure();
            tracing::error!(
                "Display server error (attempt {}): {}",
                policy.attempts(),
                error
            );
            self.report(false);

            let Some(wait) = wait else {
                tracing::error!(
                    "Display server giving up after {} attempts",
                    policy.attempts()
                );
                outcome = Err(error);
                break;
            };

            tracing::info!("Restarting display server in {}s", wait.as_secs());
            if self.shutdown.sleep(wait).await {
                break;
            }
        }

        self.set_phase(ServerPhase::Stopping);
        if self.reported_alive {
            self.report(false);
        }
        self.set_phase(ServerPhase::Stopped);
        tracing::info!("Display server stopped");
        outcome
    }

    async fn bind(&mut self) -> Result<TcpListener> {
        let listener = TcpListener::bind(&self.addr)
            .await
            .map_err(|source| ClipQaError::Bind {
                addr: self.addr.clone(),
                source,
            })?;

        if let Ok(local) = listener.local_addr() {
            // Rebind to the same port on restart, even if asked for port 0.
            self.addr = local.to_string();
            *self.handle.local_addr.lock() = Some(local);
        }

        tracing::info!("Display server listening on {}", self.addr);
        self.set_phase(ServerPhase::Listening);
        self.report(true);
        Ok(listener)
    }

    async fn serve(&self, listener: &TcpListener, policy: &mut RestartPolicy) -> ListenerExit {
        loop {
            self.set_phase(ServerPhase::Accepting);

            let accepted = tokio::select! {
                _ = self.shutdown.triggered() => return ListenerExit::Shutdown,
                accepted = tokio::time::timeout(self.config.accept_timeout(), listener.accept()) => accepted,
            };

            match accepted {
                // Idle; loop to re-check shutdown
                Err(_) => continue,
                Ok(Ok((stream, peer))) => {
                    self.set_phase(ServerPhase::Handling);
                    tracing::debug!("Connection from {}", peer);
                    self.handle_connection(stream).await;
                    policy.record_success();
                }
                Ok(Err(e)) => {
                    if self.shutdown.is_triggered() {
                        return ListenerExit::Shutdown;
                    }
                    return ListenerExit::Failed(ClipQaError::Io(e));
                }
            }
        }
    }

    /// Read one message from a connection and dispatch it
    pub async fn handle_connection(&self, mut stream: TcpStream) {
        let mut buf = vec![0u8; self.config.chunk_size.max(1)];
        match read_chunk(&mut stream, &mut buf, self.config.read_timeout()).await {
            Ok(0) => tracing::debug!("Connection closed without data"),
            Ok(n) => self.dispatch(&String::from_utf8_lossy(&buf[..n])),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                tracing::debug!("Connection timed out before sending");
            }
            Err(e) => tracing::warn!("Connection error: {}", e),
        }
    }

    /// Parse raw text and forward it to the sink
    pub fn dispatch(&self, raw: &str) {
        match Message::parse(raw) {
            Some(Message::Ping) => tracing::trace!("Heartbeat"),
            Some(message) => {
                tracing::debug!("Received {}", message.kind());
                self.sink
                    .on_message(message.kind(), message.payload().unwrap_or_default());
            }
            None => {}
        }
    }
}

/// Read until EOF, a full buffer, or the deadline.
///
/// Data received before the deadline is still returned.
async fn read_chunk(stream: &mut TcpStream, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
    let deadline = Instant::now() + timeout;
    let mut filled = 0;

    while filled < buf.len() {
        match tokio::time::timeout_at(deadline, stream.read(&mut buf[filled..])).await {
            Err(_) if filled == 0 => {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "read timed out"));
            }
            Err(_) => break,
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => filled += n,
            Ok(Err(e)) => return Err(e),
        }
    }

    Ok(filled)
}
