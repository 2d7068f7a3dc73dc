//! clipqa display daemon
//!
//! Listens for watcher messages and writes them to stdout as JSON lines.
//!
//! # Usage
//!
//! ```bash
//! clipqa-display --port 12345
//! clipqa-display --port 12345 --host 127.0.0.1 | my-overlay
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use clipqa::cli::DisplayCli;
use clipqa::{logging, ClipQaConfig, ClipQaError, JsonLinesSink, Shutdown, TransportServer};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = DisplayCli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            e.downcast_ref::<ClipQaError>()
                .map(ClipQaError::exit_code)
                .unwrap_or(ExitCode::FAILURE)
        }
    }
}

async fn run(cli: DisplayCli) -> anyhow::Result<()> {
    let mut config =
        ClipQaConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut config);
    logging::init(cli.verbose, &config.logging.level);

    let shutdown = Shutdown::new();
    shutdown.listen_for_signals();

    let addr = config.transport.endpoint();
    tracing::info!("Starting display server on {}", addr);

    let sink = Arc::new(JsonLinesSink::stdout());
    TransportServer::new(addr, config.server, sink, shutdown)
        .run()
        .await
        .context("Display server failed")?;
    Ok(())
}
