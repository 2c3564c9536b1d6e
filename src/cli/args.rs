//! Command-line argument definitions

use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::domain::model::{Destination, EncoderKind, Segment};
use crate::utils::time::parse_time;

/// How progress is shown on stderr
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressFormat {
    /// Single updating progress bar
    Plain,
    /// One JSON event per line
    Json,
    /// No progress output
    Quiet,
}

/// Options shared by every command that produces and delivers a clip
#[derive(Args, Debug, Clone)]
pub struct DeliveryArgs {
    /// Name of the finished clip (`.mp4` is appended when no extension is given)
    #[arg(short, long)]
    pub name: String,

    /// Encoder: cpu, gpu or copy
    #[arg(short, long, default_value = "cpu")]
    pub encoder: EncoderKind,

    /// Force a 16:9 display aspect ratio
    #[arg(long)]
    pub widescreen: bool,

    /// Where to deliver the clip: file, primary-site or video-host
    #[arg(short, long, default_value = "file")]
    pub destination: Destination,

    /// Clip library directory for the file destination
    #[arg(long)]
    pub library_dir: Option<PathBuf>,

    /// Progress display
    #[arg(long, value_enum, default_value_t = ProgressFormat::Plain)]
    pub progress: ProgressFormat,
}

/// Arguments for the clip command
#[derive(Args, Debug)]
pub struct ClipArgs {
    /// Source video file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Segment as START,END[,SPEED[,ZOOM]]; times are seconds, MM:SS or HH:MM:SS.
    /// Repeat to build one timeline.
    #[arg(short, long = "segment", value_parser = parse_segment, required_unless_present = "timelines")]
    pub segments: Vec<Segment>,

    /// JSON file holding a list of timelines, each a list of segments
    #[arg(long, conflicts_with = "segments")]
    pub timelines: Option<PathBuf>,

    #[command(flatten)]
    pub delivery: DeliveryArgs,
}

/// Arguments for the join command
#[derive(Args, Debug)]
pub struct JoinArgs {
    /// Files to join, in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub delivery: DeliveryArgs,
}

/// Arguments for the probe command
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Files to probe
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Parse `START,END[,SPEED[,ZOOM]]`
pub fn parse_segment(value: &str) -> Result<Segment, String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if !(2..=4).contains(&parts.len()) {
        return Err(format!("expected START,END[,SPEED[,ZOOM]], got '{}'", value));
    }
    let start = parse_time(parts[0]).map_err(|e| e.to_string())?;
    let end = parse_time(parts[1]).map_err(|e| e.to_string())?;
    let speed = match parts.get(2) {
        Some(speed) => speed
            .parse::<f64>()
            .map_err(|_| format!("invalid speed '{}'", speed))?,
        None => 1.0,
    };
    let zoom = match parts.get(3) {
        Some(zoom) => zoom
            .parse::<u32>()
            .map_err(|_| format!("invalid zoom '{}'", zoom))?,
        None => 1,
    };
    Segment::new(start, end, speed, zoom).map_err(|e| e.to_string())
}
