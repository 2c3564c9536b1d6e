// Domain models - Core types and data structures

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::utils::path::safe_file_name;

/// A time-bounded cut `[start, end)` with speed and zoom applied uniformly within it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSegment")]
pub struct Segment {
    start: f64,
    end: f64,
    speed: f64,
    zoom: u32,
}

/// Unvalidated segment as it appears in an edit file
#[derive(Debug, Deserialize)]
struct RawSegment {
    start: f64,
    end: f64,
    #[serde(default = "unit_speed")]
    speed: f64,
    #[serde(default = "unit_zoom")]
    zoom: u32,
}

fn unit_speed() -> f64 {
    1.0
}

fn unit_zoom() -> u32 {
    1
}

impl TryFrom<RawSegment> for Segment {
    type Error = DomainError;

    fn try_from(raw: RawSegment) -> Result<Self, Self::Error> {
        Segment::new(raw.start, raw.end, raw.speed, raw.zoom)
    }
}

impl Segment {
    /// Create a new segment with validation
    pub fn new(start: f64, end: f64, speed: f64, zoom: u32) -> Result<Self, DomainError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(DomainError::validation("Segment bounds must be finite"));
        }
        if start < 0.0 {
            return Err(DomainError::validation(format!(
                "Segment start cannot be negative ({})",
                start
            )));
        }
        if end <= start {
            return Err(DomainError::validation(format!(
                "Invalid start and end times: end ({}) must be greater than start ({})",
                end, start
            )));
        }
        if !speed.is_finite() || speed <= 0.0 {
            return Err(DomainError::validation(format!(
                "Segment speed must be positive, got {}",
                speed
            )));
        }
        if zoom < 1 {
            return Err(DomainError::validation("Segment zoom must be at least 1"));
        }
        Ok(Self {
            start,
            end,
            speed,
            zoom,
        })
    }

    /// Plain cut at normal speed without zoom
    pub fn cut(start: f64, end: f64) -> Result<Self, DomainError> {
        Self::new(start, end, 1.0, 1)
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn zoom(&self) -> u32 {
        self.zoom
    }

    /// Length of the cut in source time
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Length of the cut once the speed change is applied
    pub fn output_duration(&self) -> f64 {
        self.duration() / self.speed
    }

    pub fn has_speed_change(&self) -> bool {
        self.speed != 1.0
    }

    pub fn has_zoom(&self) -> bool {
        self.zoom > 1
    }
}

/// An ordered sequence of segments forming one continuous edited track
///
/// Segments are kept in the order they were added; the timeline never
/// re-sorts them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timeline {
    segments: Vec<Segment>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether the segment at `index` is the final one of this timeline.
    /// Moving the end edge of the last segment also moves the playback cursor.
    pub fn is_last(&self, index: usize) -> bool {
        !self.segments.is_empty() && index == self.segments.len() - 1
    }

    /// Duration contribution of this timeline: Σ (end − start) / speed
    pub fn duration(&self) -> f64 {
        self.segments.iter().map(Segment::output_duration).sum()
    }
}

/// What gets encoded: cuts of one source file, or whole files joined verbatim
#[derive(Debug, Clone, PartialEq)]
pub enum ClipSource {
    /// One or more timelines cut out of a single source file
    Timelines {
        source: PathBuf,
        timelines: Vec<Timeline>,
    },
    /// Multi-clip mode: whole files concatenated in order
    Files(Vec<PathBuf>),
}

impl ClipSource {
    /// Check the source has something to encode
    pub fn validate(&self) -> Result<(), DomainError> {
        match self {
            ClipSource::Timelines { timelines, .. } => {
                if timelines.is_empty() {
                    return Err(DomainError::validation("At least one timeline is required"));
                }
                if let Some(index) = timelines.iter().position(Timeline::is_empty) {
                    return Err(DomainError::validation(format!(
                        "Timeline {} has no segments",
                        index + 1
                    )));
                }
                Ok(())
            }
            ClipSource::Files(files) => {
                if files.is_empty() {
                    return Err(DomainError::validation("At least one file is required to join"));
                }
                Ok(())
            }
        }
    }
}

/// Output file name for a clip, safe to use on any file system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipName(String);

impl ClipName {
    /// Sanitize a user supplied name. Appends `.mp4` when no extension is given.
    pub fn new(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Please enter a file name"));
        }
        let mut name = safe_file_name(trimmed);
        if !name.contains('.') || name.ends_with('.') {
            name.push_str(".mp4");
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClipName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encode progress snapshot; consumers keep only the latest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EncodeProgress {
    pub percent_complete: u8,
    pub frames_per_second: u32,
}

impl EncodeProgress {
    pub fn new(percent_complete: i64, frames_per_second: u32) -> Self {
        Self {
            percent_complete: percent_complete.clamp(0, 100) as u8,
            frames_per_second,
        }
    }
}

/// Upload progress snapshot; consumers keep only the latest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UploadProgress {
    pub percent_complete: u8,
    pub bits_per_second: u64,
}

impl UploadProgress {
    pub fn new(percent_complete: i64, bits_per_second: u64) -> Self {
        Self {
            percent_complete: percent_complete.clamp(0, 100) as u8,
            bits_per_second,
        }
    }

    /// Sample progress from bytes sent so far
    pub fn from_transfer(sent: u64, total: u64, elapsed: std::time::Duration) -> Self {
        let percent = if total == 0 {
            100
        } else {
            (sent as f64 / total as f64 * 100.0) as i64
        };
        let millis = elapsed.as_millis() as u64;
        let bits_per_second = if millis == 0 {
            0
        } else {
            sent.saturating_mul(8).saturating_mul(1000) / millis
        };
        Self::new(percent, bits_per_second)
    }
}

/// Where the finished clip is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Destination {
    /// Form upload to the primary web site
    PrimarySite,
    /// Move into the local clip library
    File,
    /// Resumable upload to the video hosting service
    VideoHost,
}

impl FromStr for Destination {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "primary-site" | "site" | "web" => Ok(Destination::PrimarySite),
            "file" | "local" => Ok(Destination::File),
            "video-host" | "youtube" => Ok(Destination::VideoHost),
            _ => Err(DomainError::validation(format!(
                "Invalid destination: {}. Valid destinations: file, primary-site, video-host",
                s
            ))),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Destination::PrimarySite => "primary-site",
            Destination::File => "file",
            Destination::VideoHost => "video-host",
        };
        f.write_str(name)
    }
}

/// Transcoder backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderKind {
    /// Software H.264
    Cpu,
    /// NVIDIA hardware H.264
    Gpu,
    /// No re-encode, lossless container cut
    Copy,
}

impl FromStr for EncoderKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(EncoderKind::Cpu),
            "gpu" | "nvenc" => Ok(EncoderKind::Gpu),
            "copy" => Ok(EncoderKind::Copy),
            _ => Err(DomainError::validation(format!(
                "Invalid encoder: {}. Valid encoders: cpu, gpu, copy",
                s
            ))),
        }
    }
}

impl fmt::Display for EncoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EncoderKind::Cpu => "cpu",
            EncoderKind::Gpu => "gpu",
            EncoderKind::Copy => "copy",
        };
        f.write_str(name)
    }
}

/// Lifecycle of one encode-then-deliver call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipState {
    Idle,
    Encoding,
    Uploading,
    MovingToFile,
    Done,
    Error,
    Cancelled,
}

impl ClipState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClipState::Done | ClipState::Error | ClipState::Cancelled)
    }
}

/// Everything the orchestrator needs for one call
#[derive(Debug, Clone)]
pub struct ClipRequest {
    pub source: ClipSource,
    pub clip_name: String,
    pub encoder: EncoderKind,
    pub force_widescreen: bool,
    pub destination: Destination,
    /// Base directory of the local clip library, used by `Destination::File`
    pub library_dir: PathBuf,
}
