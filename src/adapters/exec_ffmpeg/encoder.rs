//! Encode port backed by the external transcoder

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::try_join_all;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::runner::FfmpegRunner;
use crate::domain::errors::DomainError;
use crate::domain::model::{EncodeProgress, EncoderKind, Timeline};
use crate::planner::{build_concat_command, build_cut_command};
use crate::ports::{EncodePort, ProbePort, SharedSink};

/// Builds commands through the planner and executes them with the runner.
/// No retries: a failed run is final for the call.
pub struct FfmpegEncoder {
    runner: FfmpegRunner,
    probe: Arc<dyn ProbePort>,
}

impl FfmpegEncoder {
    pub fn new(runner: FfmpegRunner, probe: Arc<dyn ProbePort>) -> Self {
        Self { runner, probe }
    }

    /// Probe every input concurrently and sum their durations
    async fn total_duration(&self, files: &[PathBuf], cancel: &CancellationToken) -> Result<f64, DomainError> {
        let durations =
            try_join_all(files.iter().map(|file| self.probe.probe_duration(file, cancel))).await?;
        Ok(durations.iter().sum())
    }
}

#[async_trait]
impl EncodePort for FfmpegEncoder {
    async fn encode_timelines(
        &self,
        source: &Path,
        output: &Path,
        timelines: &[Timeline],
        kind: EncoderKind,
        force_widescreen: bool,
        progress: SharedSink<EncodeProgress>,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError> {
        let command = build_cut_command(source, output, timelines, kind, force_widescreen)?;
        let expected = command.expected_duration.unwrap_or_default();
        info!(
            source = %source.display(),
            encoder = %kind,
            segments = timelines.iter().map(Timeline::len).sum::<usize>(),
            expected_duration = expected,
            "Encoding timelines"
        );
        self.runner.run(&command.args, expected, progress.as_ref(), cancel).await
    }

    async fn encode_files(
        &self,
        files: &[PathBuf],
        output: &Path,
        kind: EncoderKind,
        force_widescreen: bool,
        progress: SharedSink<EncodeProgress>,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError> {
        let command = build_concat_command(files, output, kind, force_widescreen)?;
        let expected = self.total_duration(files, cancel).await?;
        info!(
            files = files.len(),
            encoder = %kind,
            expected_duration = expected,
            "Joining files"
        );
        self.runner.run(&command.args, expected, progress.as_ref(), cancel).await
    }
}
