//! Cinema Jobs - Command-line entry point
//! Composition root: loads settings, installs logging, runs one command.

mod app;
mod cli;
mod settings;
mod telemetry;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load configuration (file → environment → CLI)
    let settings = settings::load(&cli)?;

    // 2. Initialize logging
    telemetry::init_logging(&settings.logging)?;
    debug!(version = cinema_core::VERSION, ?settings, "Settings resolved");

    // 3. Run the command
    match &cli.command {
        Command::Export(args) => app::export(&settings, args).await,
        Command::Sweep(args) => app::sweep(&settings, args).await,
        Command::Showtimes(args) => app::showtimes(&settings, args).await,
    }
}
