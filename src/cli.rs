//! CLI argument definitions for both binaries
//!
//! Flags given on the command line override the config file.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::config::ClipQaConfig;

/// Clipboard question watcher
#[derive(Parser, Debug)]
#[command(name = "clipqa")]
#[command(about = "Watch the clipboard for questions and relay matching answers to the display")]
#[command(version)]
pub struct WatchCli {
    /// Config file (default: <config dir>/clipqa/config.toml)
    #[arg(short, long, env = "CLIPQA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Question/answer JSON file
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Display host
    #[arg(long)]
    pub host: Option<String>,

    /// Display port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Load the corpus, probe the display once, and exit
    #[arg(long)]
    pub check: bool,

    /// Write the effective config (file plus flags) to the config path and exit
    #[arg(long, conflicts_with = "check")]
    pub write_config: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl WatchCli {
    /// Overlay command-line values onto a loaded config
    pub fn apply(&self, config: &mut ClipQaConfig) {
        if let Some(corpus) = &self.corpus {
            config.corpus.path = corpus.clone();
        }
        if let Some(host) = &self.host {
            config.transport.host = host.clone();
        }
        if let Some(port) = self.port {
            config.transport.port = port;
        }
    }
}

/// Display-side listener
#[derive(Parser, Debug)]
#[command(name = "clipqa-display")]
#[command(about = "Receive clipqa messages and print them as JSON lines")]
#[command(version)]
pub struct DisplayCli {
    /// Config file (default: <config dir>/clipqa/config.toml)
    #[arg(short, long, env = "CLIPQA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl DisplayCli {
    pub fn apply(&self, config: &mut ClipQaConfig) {
        if let Some(host) = &self.host {
            config.transport.host = host.clone();
        }
        if let Some(port) = self.port {
            config.transport.port = port;
        }
    }
}
