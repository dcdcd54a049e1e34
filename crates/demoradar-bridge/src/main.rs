//! Replay-to-radar bridge entry point.
//!
//! The bridge repeatedly parses a replay that is still being recorded,
//! keeps only the newest tick, prints it as a console table, and streams
//! it as JSON to the radar backend over a WebSocket.
//!
//! # Architecture
//!
//! ```text
//! replay export --> PollLoop (parse, normalize, render) --> Publisher --> radar backend
//! ```
//!
//! Startup blocks until the backend accepts a connection. After that the
//! loop never exits on its own: unreadable replays and dropped connections
//! are retried with a fixed delay.

mod cli;

use std::path::PathBuf;
use std::time::SystemTime;

use anyhow::Context;
use clap::Parser;
use demoradar_core::watch::wait_for_new_source;
use demoradar_core::{
    BridgeConfig, DisplayMode, JsonDumpSource, LoopSettings, PollLoop, Publisher, WsConnector,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

/// Application entry point.
///
/// Initializes logging, loads configuration, resolves the replay source,
/// connects to the radar backend, then runs the poll loop indefinitely.
///
/// # Errors
///
/// Returns an error if the configuration file cannot be loaded or no
/// source was given.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let started = SystemTime::now();

    // Logs go to stderr; stdout belongs to the table.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("demoradar-bridge starting");

    let mut config = match &cli.config {
        Some(path) => BridgeConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => BridgeConfig::default(),
    };
    if cli.minimal {
        config.display.mode = DisplayMode::Minimal;
    }
    info!(
        ws_url = config.stream.ws_url,
        reconnect_delay_ms = config.stream.reconnect_delay_ms,
        not_ready_delay_ms = config.source.not_ready_delay_ms,
        cycle_interval_ms = config.cycle_interval().as_millis(),
        display = ?config.display.mode,
        "configuration loaded"
    );

    let source_path = resolve_source(&cli, &config, started).await?;
    info!(source = %source_path.display(), "replay source selected");
    let source = JsonDumpSource::new(source_path);

    let mut publisher = Publisher::new(
        WsConnector::new(config.stream.ws_url.clone()),
        config.reconnect_retry(),
    )
    .with_send_timeout(config.send_timeout());
    publisher.connect().await;

    let mut poll = PollLoop::new(
        source,
        publisher,
        std::io::stdout(),
        LoopSettings::from_config(&config),
    );
    poll.run().await;

    Ok(())
}

/// The replay to stream: watched for, or named on the command line.
async fn resolve_source(
    cli: &Cli,
    config: &BridgeConfig,
    started: SystemTime,
) -> anyhow::Result<PathBuf> {
    if let Some(dir) = &cli.watch {
        return Ok(wait_for_new_source(
            dir,
            &config.source.watch_extension,
            started,
            config.watch_poll_retry(),
            config.watch_settle(),
        )
        .await);
    }

    let arg = cli
        .source
        .as_deref()
        .context("a SOURCE argument or --watch <DIR> is required")?;
    Ok(config.resolve_source(arg))
}
