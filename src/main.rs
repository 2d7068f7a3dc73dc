//! clipqa watcher entry point

use std::process::ExitCode;

use clap::Parser;

use clipqa::cli::WatchCli;
use clipqa::{
    logging, ClipQaConfig, ClipQaError, CommandSource, Corpus, Shutdown, TransportClient, WatchLoop,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = WatchCli::parse();

    let mut config = match ClipQaConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return e.exit_code();
        }
    };
    cli.apply(&mut config);
    logging::init(cli.verbose, &config.logging.level);

    match run(&cli, config).await {
        Ok(code) => code,
        Err(e) if e.is_load_error() => {
            tracing::error!("Failed to load corpus: {}", e);
            e.exit_code()
        }
        Err(e) => {
            tracing::error!("{}", e);
            e.exit_code()
        }
    }
}

async fn run(cli: &WatchCli, config: ClipQaConfig) -> clipqa::Result<ExitCode> {
    if cli.write_config {
        return write_config(cli, &config);
    }

    let corpus = Corpus::load(&config.corpus.path)?;

    let shutdown = Shutdown::new();
    let mut client = TransportClient::new(config.transport.clone(), shutdown.clone());

    if cli.check {
        return Ok(check(&corpus, &mut client).await);
    }

    let source = CommandSource::from_config(&config.clipboard)?.with_shutdown(shutdown.clone());
    tracing::info!("Reading clipboard with {}", source.program());

    shutdown.listen_for_signals();
    if !client.test_connection().await {
        tracing::warn!(
            "Display not reachable at {}; answers will be retried as questions arrive",
            client.endpoint()
        );
    }

    let mut watch = WatchLoop::new(corpus, source, client, config.watch, shutdown);
    watch.run().await?;
    Ok(ExitCode::SUCCESS)
}

/// Save the effective configuration and exit
fn write_config(cli: &WatchCli, config: &ClipQaConfig) -> clipqa::Result<ExitCode> {
    let path = cli
        .config
        .clone()
        .or_else(ClipQaConfig::default_path)
        .ok_or_else(|| ClipQaError::Config {
            message: "No config directory found; pass --config".to_string(),
        })?;
    config.save(&path)?;
    println!("Config written to {}", path.display());
    Ok(ExitCode::SUCCESS)
}

/// Report corpus and display status without watching
async fn check(corpus: &Corpus, client: &mut TransportClient) -> ExitCode {
    println!(
        "corpus: {} records, {} valid",
        corpus.total_records(),
        corpus.len()
    );
    for rejected in corpus.rejected() {
        println!("  record {} skipped: {}", rejected.index, rejected.reason);
    }

    let reachable = client.test_connection().await;
    println!(
        "display: {} ({})",
        client.endpoint(),
        if reachable { "reachable" } else { "unreachable" }
    );

    if reachable {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
