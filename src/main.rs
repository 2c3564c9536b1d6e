//! ClipShip CLI
//!
//! Trim, speed up, zoom and stitch video clips with ffmpeg, then deliver them
//! to disk or the web.
//!
//! # Usage
//!
//! ```bash
//! clipship clip --input match.mp4 --segment 10,40 --segment 1:05,1:20,2 --name goal
//! clipship join part1.mp4 part2.mp4 --name full --destination video-host
//! clipship probe match.mp4
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use clipship::adapters::{init_logging, AppConfig};
use clipship::app::DefaultAppContainer;
use clipship::cli::commands::{self, cancel_on_interrupt};
use clipship::cli::Cli;

/// Main entry point for the ClipShip CLI application
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // File, then environment, then command line
    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);
    init_logging(&config.logging)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting ClipShip");

    let container = DefaultAppContainer::new(config)?;
    let cancel = cancel_on_interrupt();

    if let Err(e) = commands::run(&container, cli.command, cancel).await {
        error!("{:#}", e);
        return Err(e);
    }

    info!("ClipShip completed successfully");
    Ok(())
}
