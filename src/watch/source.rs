//! Text sources the watch loop polls
//!
//! The watch loop only needs "what is the current text?". A source answers
//! with the text (possibly empty), or `None` once it can never answer again,
//! e.g. because the clipboard tool is not installed.

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::process::Command;

use crate::config::ClipboardConfig;
use crate::error::{ClipQaError, Result};
use crate::shutdown::Shutdown;

const READ_TIMEOUT: Duration = Duration::from_secs(2);
const READ_ATTEMPTS: u32 = 3;
const RETRY_PAUSE: Duration = Duration::from_millis(500);

/// Something that holds the current text snippet
pub trait TextSource: Send {
    /// Human-readable name for logs
    fn describe(&self) -> String;

    /// Current text, `Ok(None)` when the source is permanently unavailable
    fn read_current_text(&mut self) -> impl Future<Output = Result<Option<String>>> + Send;
}

/// Reads the clipboard by running an external command.
///
/// A running command and the pause between attempts both end early once
/// the attached [`Shutdown`] fires.
#[derive(Debug, Clone)]
pub struct CommandSource {
    program: String,
    args: Vec<String>,
    shutdown: Shutdown,
}

impl CommandSource {
    /// Build from `[program, args...]`; `None` for an empty command
    pub fn new(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            shutdown: Shutdown::new(),
        })
    }

    /// Stop reads when `shutdown` is triggered
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Pick the first installed clipboard tool for this session
    pub fn detect() -> Option<Self> {
        let wayland = std::env::var_os("WAYLAND_DISPLAY").is_some()
            || std::env::var("XDG_SESSION_TYPE").is_ok_and(|t| t.eq_ignore_ascii_case("wayland"));

        let wl_paste: &[&str] = &["wl-paste", "--no-newline"];
        let xclip: &[&str] = &["xclip", "-selection", "clipboard", "-o"];
        let xsel: &[&str] = &["xsel", "--clipboard", "--output"];
        let candidates = if wayland {
            [wl_paste, xclip, xsel]
        } else {
            [xclip, xsel, wl_paste]
        };

        candidates
            .into_iter()
            .find(|command| which::which(command[0]).is_ok())
            .map(|command| Self {
                program: command[0].to_string(),
                args: command[1..].iter().map(|s| s.to_string()).collect(),
                shutdown: Shutdown::new(),
            })
    }

    /// Configured command, falling back to detection
    pub fn from_config(config: &ClipboardConfig) -> Result<Self> {
        let source = match &config.command {
            Some(command) => Self::new(command),
            None => Self::detect(),
        };
        source.ok_or_else(|| ClipQaError::ClipboardUnavailable {
            tool: config
                .command
                .as_ref()
                .map(|c| c.join(" "))
                .unwrap_or_else(|| "wl-paste, xclip or xsel".to_string()),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl TextSource for CommandSource {
    fn describe(&self) -> String {
        self.program.clone()
    }

    async fn read_current_text(&mut self) -> Result<Option<String>> {
        for attempt in 1..=READ_ATTEMPTS {
            if self.shutdown.is_triggered() {
                break;
            }

            let mut command = Command::new(&self.program);
            command.args(&self.args).kill_on_drop(true);
            let run = command.output();

            // Dropping `run` kills the child
            let outcome = tokio::select! {
                _ = self.shutdown.triggered() => break,
                outcome = tokio::time::timeout(READ_TIMEOUT, run) => outcome,
            };

            match outcome {
                Ok(Ok(output)) if output.status.success() => {
                    return Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()));
                }
                Ok(Ok(output)) => {
                    tracing::debug!("{} exited with {}", self.program, output.status);
                }
                Ok(Err(e)) if e.kind() == io::ErrorKind::NotFound => {
                    tracing::error!("{} is not installed", self.program);
                    return Ok(None);
                }
                Ok(Err(e)) => {
                    tracing::warn!("Clipboard error (attempt {}): {}", attempt, e);
                }
                Err(_) => {
                    tracing::warn!("Clipboard timeout (attempt {})", attempt);
                }
            }

            if attempt < READ_ATTEMPTS && self.shutdown.sleep(RETRY_PAUSE).await {
                break;
            }
        }

        Ok(Some(String::new()))
    }
}
