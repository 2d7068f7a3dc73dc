//! Fixtures shared by the integration tests

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::task::JoinHandle;

use clipqa::config::ServerConfig;
use clipqa::{DisplaySink, MessageKind, ServerHandle, Shutdown, TransportServer};

/// Small corpus used across tests
pub const SAMPLE_CORPUS: &str = r#"[
  {"question": "What is 2+2?", "answer": "4"},
  {"question": "capital of France", "answer": "Paris"},
  {"question": "primary colours", "answers": ["red", "yellow", "blue"]}
]"#;

/// Temp directory holding corpus and config files
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the workspace and return its full path
    pub fn add_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.dir.path().join(relative_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("Failed to write file");
        full_path
    }

    pub fn add_corpus(&self, content: &str) -> PathBuf {
        self.add_file("answers.json", content)
    }

    /// Run the `clipqa` binary with an isolated config location
    pub fn run_watcher(&self, args: &[&str]) -> Output {
        let config = self.dir.path().join("config.toml");
        Command::new(env!("CARGO_BIN_EXE_clipqa"))
            .current_dir(self.path())
            .env("CLIPQA_CONFIG", &config)
            .env_remove("RUST_LOG")
            .args(args)
            .output()
            .expect("Failed to run clipqa")
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Sink that records every notification
#[derive(Default)]
pub struct RecordingSink {
    pub messages: Mutex<Vec<(MessageKind, String)>>,
    pub statuses: Mutex<Vec<bool>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<(MessageKind, String)> {
        self.messages.lock().clone()
    }

    /// Wait until at least `count` messages arrived, or give up after ~2s
    pub async fn wait_for(&self, count: usize) -> Vec<(MessageKind, String)> {
        for _ in 0..200 {
            if self.messages.lock().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.messages()
    }
}

impl DisplaySink for RecordingSink {
    fn on_message(&self, kind: MessageKind, payload: &str) {
        self.messages.lock().push((kind, payload.to_string()));
    }

    fn on_connection_status(&self, alive: bool) {
        self.statuses.lock().push(alive);
    }
}

/// A display server on an ephemeral loopback port
pub struct RunningServer {
    pub addr: SocketAddr,
    pub sink: Arc<RecordingSink>,
    pub handle: ServerHandle,
    pub shutdown: Shutdown,
    pub task: JoinHandle<clipqa::Result<()>>,
}

impl RunningServer {
    pub async fn start() -> Self {
        let sink = Arc::new(RecordingSink::default());
        let shutdown = Shutdown::new();
        let config = ServerConfig {
            accept_timeout_ms: 100,
            read_timeout_ms: 500,
            ..ServerConfig::default()
        };
        let server = TransportServer::new("127.0.0.1:0", config, Arc::clone(&sink), shutdown.clone());
        let handle = server.handle();
        let task = tokio::spawn(server.run());

        let mut addr = None;
        for _ in 0..200 {
            addr = handle.local_addr();
            if addr.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        Self {
            addr: addr.expect("server never bound"),
            sink,
            handle,
            shutdown,
            task,
        }
    }

    pub async fn stop(self) -> clipqa::Result<()> {
        self.shutdown.trigger();
        self.task.await.expect("server task panicked")
    }
}
