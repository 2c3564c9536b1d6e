//! Transcoder command synthesis
//!
//! Pure builders that turn timelines or file lists into a transcoder argument
//! vector. Nothing here touches the file system or spawns a process.

use std::path::{Path, PathBuf};

use crate::domain::errors::DomainError;
use crate::domain::model::{EncoderKind, Timeline};
use crate::domain::rules::EncoderRules;
use crate::utils::time::format_seconds;

pub mod filter_graph;
pub mod profiles;

use filter_graph::{FINAL_AUDIO, FINAL_VIDEO};
use profiles::{EncoderProfile, CONTAINER_ARGS};

/// Arguments every invocation starts with
const PREAMBLE: [&str; 2] = ["-hide_banner", "-nostdin"];

/// A synthesized transcoder invocation
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeCommand {
    /// Argument vector, one entry per argument, no shell quoting
    pub args: Vec<String>,
    /// Output duration used to normalize progress; unknown for whole-file joins
    /// until the inputs are probed
    pub expected_duration: Option<f64>,
}

impl TranscodeCommand {
    fn new() -> Self {
        Self {
            args: PREAMBLE.iter().map(|arg| arg.to_string()).collect(),
            expected_duration: None,
        }
    }

    fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    fn path(&mut self, path: &Path) -> &mut Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    fn static_args(&mut self, args: &[&str]) -> &mut Self {
        self.args.extend(args.iter().map(|arg| arg.to_string()));
        self
    }

    fn finish(mut self, kind: EncoderKind, output: &Path) -> Self {
        self.static_args(EncoderProfile::for_kind(kind).args)
            .static_args(&CONTAINER_ARGS)
            .arg("-y")
            .path(output);
        self
    }

    /// Whether the command routes through a filter graph
    pub fn uses_filter_graph(&self) -> bool {
        self.args.iter().any(|arg| arg == "-filter_complex")
    }
}

/// Build the command cutting `timelines` out of `source` into `output`.
///
/// `EncoderKind::Copy` skips the filter graph and seeks on the container;
/// it is rejected unless the request is a single plain cut.
pub fn build_cut_command(
    source: &Path,
    output: &Path,
    timelines: &[Timeline],
    kind: EncoderKind,
    force_widescreen: bool,
) -> Result<TranscodeCommand, DomainError> {
    EncoderRules::validate_cut(kind, timelines)?;

    let mut command = TranscodeCommand::new();

    if kind == EncoderKind::Copy {
        let segment = &timelines[0].segments()[0];
        command
            .arg("-ss")
            .arg(format_seconds(segment.start()))
            .arg("-i")
            .path(source)
            .arg("-t")
            .arg(format_seconds(segment.duration()))
            .static_args(&["-avoid_negative_ts", "make_zero"]);
        command.expected_duration = Some(segment.duration());
        return Ok(command.finish(kind, output));
    }

    let graph = filter_graph::cut_filter_graph(timelines, force_widescreen)?;
    command
        .arg("-i")
        .path(source)
        .arg("-filter_complex")
        .arg(graph)
        .static_args(&["-map", FINAL_VIDEO, "-map", FINAL_AUDIO]);
    command.expected_duration = Some(timelines.iter().map(Timeline::duration).sum());
    Ok(command.finish(kind, output))
}

/// Build the command joining whole `files`, in order, into `output`
pub fn build_concat_command(
    files: &[PathBuf],
    output: &Path,
    kind: EncoderKind,
    force_widescreen: bool,
) -> Result<TranscodeCommand, DomainError> {
    EncoderRules::validate_join(kind)?;
    if files.is_empty() {
        return Err(DomainError::validation("At least one file is required to join"));
    }

    let mut command = TranscodeCommand::new();
    for file in files {
        command.arg("-i").path(file);
    }
    command
        .arg("-filter_complex")
        .arg(filter_graph::concat_filter_graph(files.len(), force_widescreen))
        .static_args(&["-map", FINAL_VIDEO, "-map", FINAL_AUDIO]);
    Ok(command.finish(kind, output))
}
