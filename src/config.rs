//! clipqa configuration management.
//!
//! Handles the configuration file at:
//! - Linux/macOS: ~/.config/clipqa/config.toml
//! - Windows: %APPDATA%\clipqa\config.toml
//!
//! Every field has a default, so a missing file or a partial file is fine.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ClipQaError, Result};

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClipQaConfig {
    #[serde(default)]
    pub corpus: CorpusConfig,

    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub clipboard: ClipboardConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Question corpus location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    #[serde(default = "default_corpus_path")]
    pub path: PathBuf,
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from("answers.json")
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: default_corpus_path(),
        }
    }
}

/// Sender side of the display socket
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub host: String,
    pub port: u16,
    /// Per-attempt timeout for regular messages
    pub send_timeout_ms: u64,
    /// Timeout for the PING probe
    pub probe_timeout_ms: u64,
    /// Attempts per message, including the first
    pub max_retries: u32,
    /// Backoff before retry `n` is `n * backoff_step_ms`
    pub backoff_step_ms: u64,
    /// Pause after a successful CLEAR
    pub clear_settle_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 12345,
            send_timeout_ms: 3000,
            probe_timeout_ms: 2000,
            max_retries: 3,
            backoff_step_ms: 500,
            clear_settle_ms: 100,
        }
    }
}

impl TransportConfig {
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn backoff_step(&self) -> Duration {
        Duration::from_millis(self.backoff_step_ms)
    }

    pub fn clear_settle(&self) -> Duration {
        Duration::from_millis(self.clear_settle_ms)
    }
}

/// Display side listener
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// How long one accept waits before re-checking for shutdown
    pub accept_timeout_ms: u64,
    pub read_timeout_ms: u64,
    /// Bytes read per connection
    pub chunk_size: usize,
    /// Restarts of the listener before giving up
    pub max_restarts: u32,
    /// Cap on the wait between restarts
    pub max_restart_wait_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            accept_timeout_ms: 2000,
            read_timeout_ms: 5000,
            chunk_size: 1024,
            max_restarts: 5,
            max_restart_wait_secs: 10,
        }
    }
}

impl ServerConfig {
    pub fn accept_timeout(&self) -> Duration {
        Duration::from_millis(self.accept_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Wait before restart number `restart` (1-based)
    pub fn restart_wait(&self, restart: u32) -> Duration {
        Duration::from_secs((u64::from(restart) * 2).min(self.max_restart_wait_secs))
    }
}

/// Clipboard polling and circuit breaker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub poll_interval_ms: u64,
    /// Snippets shorter than this are recorded but never matched
    pub min_snippet_chars: usize,
    /// Consecutive errors before pausing
    pub max_errors: u32,
    pub error_pause_secs: u64,
    pub probe_interval_secs: u64,
    /// Pause after an unexpected iteration failure
    pub error_backoff_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 200,
            min_snippet_chars: 8,
            max_errors: 10,
            error_pause_secs: 30,
            probe_interval_secs: 10,
            error_backoff_ms: 1000,
        }
    }
}

impl WatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn error_pause(&self) -> Duration {
        Duration::from_secs(self.error_pause_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }
}

/// Clipboard read command override
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClipboardConfig {
    /// Program and arguments, e.g. `["xclip", "-selection", "clipboard", "-o"]`
    #[serde(default)]
    pub command: Option<Vec<String>>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ClipQaConfig {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("clipqa").join("config.toml"))
    }

    /// Load config from the given path, or the default location.
    ///
    /// A missing file yields defaults; an unreadable or invalid file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => path,
            None => return Ok(Self::default()),
        };

        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        Self::from_toml(&content).map_err(|e| ClipQaError::Config {
            message: format!("{}: {}", path.display(), e),
        })
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save config to a path, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| ClipQaError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;
        fs::write(path, content)?;
        Ok(())
    }
}
