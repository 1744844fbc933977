//! vidrelay CLI - Command-line interface
//!
//! Runs the relay server and exposes identifier extraction and resolution
//! for scripting and troubleshooting.

mod commands;

use std::path::PathBuf;

use clap::Parser;
use vidrelay_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "vidrelay")]
#[command(about = "Range-aware video relay with a headless player")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: commands::Commands,

    /// Console log level (RUST_LOG takes precedence)
    #[arg(long, global = true, value_enum, default_value_t = CliLogLevel::default())]
    log_level: CliLogLevel,

    /// Directory for the full trace log
    #[arg(long, global = true)]
    logs_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_level.as_tracing_level(), cli.logs_dir.as_deref())
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    commands::handle_command(cli.command).await
}
