//! CLI module for ClipShip
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::adapters::toml_config::AppConfig;

pub mod args;
pub mod commands;
pub mod progress;

/// ClipShip
///
/// Cut segments out of a video with optional speed change and zoom, join
/// them with ffmpeg, then save the clip locally or upload it.
#[derive(Parser, Debug)]
#[command(name = "clipship")]
#[command(about = "ClipShip - trim, stitch and deliver video clips")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (default: clipship.toml or config/clipship.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Logging level
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cut segments out of one video and deliver the result
    Clip(args::ClipArgs),
    /// Join whole video files and deliver the result
    Join(args::JoinArgs),
    /// Print the duration of video files
    Probe(args::ProbeArgs),
}

impl Cli {
    /// Command-line settings take precedence over environment and file
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(level) = &self.log_level {
            config.logging.level = level.to_lowercase();
        }
        if self.json_logs {
            config.logging.json = true;
        }
    }
}
