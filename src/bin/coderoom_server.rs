//! The relay binary: loads settings, installs a `tracing` subscriber and
//! serves rooms until killed.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use coderoom::config::{Config, ServerSettings};
use coderoom::log::{LogLevel, LogSink, TracingLogSink};
use coderoom::signaling::run::run_signaling_server_with_log;

#[derive(Debug, Parser)]
#[command(name = "coderoom_server", about = "Room, negotiation and broadcast relay")]
struct Args {
    /// INI config file with [Server], [Heartbeat] and [Logging] sections.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides `[Server] listen_addr`.
    #[arg(short, long)]
    listen: Option<String>,

    /// Default log level when RUST_LOG is unset.
    #[arg(long)]
    log_level: Option<LogLevel>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::empty(),
    };
    let mut settings = ServerSettings::from_config(&config)?;
    if let Some(addr) = args.listen {
        settings.listen_addr = addr;
    }
    if let Some(level) = args.log_level {
        settings.log_level = level;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(settings.log_level.as_str())),
        )
        .init();

    tracing::info!(listen = %settings.listen_addr, "starting coderoom_server");

    let log_sink: Arc<dyn LogSink> = Arc::new(TracingLogSink);
    run_signaling_server_with_log(settings, log_sink)?;
    Ok(())
}
