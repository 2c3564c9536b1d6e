//! Duration probe built on the transcoder's input banner

use std::path::Path;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::runner::FfmpegRunner;
use crate::domain::errors::DomainError;
use crate::ports::ProbePort;
use crate::utils::time::parse_clock;

static DURATION_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Duration: (\d\d:\d\d:\d\d\.\d\d)").expect("static regex failed"));

/// Extract the first `Duration: HH:MM:SS.ff` value from transcoder output
pub fn parse_duration(output: &str) -> Option<f64> {
    output
        .split(['\r', '\n'])
        .find_map(|line| DURATION_LINE.captures(line))
        .and_then(|captures| parse_clock(captures.get(1)?.as_str()))
}

/// Probes a file by opening it with no output; the transcoder prints the
/// container duration and exits non-zero, which is expected here
pub struct FfmpegProbe {
    runner: FfmpegRunner,
}

impl FfmpegProbe {
    pub fn new(runner: FfmpegRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl ProbePort for FfmpegProbe {
    async fn probe_duration(&self, path: &Path, cancel: &CancellationToken) -> Result<f64, DomainError> {
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }

        let args = vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-i".to_string(),
            path.to_string_lossy().into_owned(),
        ];
        let child = self.runner.command(&args).spawn().map_err(|e| {
            DomainError::Probe(format!("Failed to start {}: {}", self.runner.program().display(), e))
        })?;

        // Dropping the child on cancellation kills it
        let output = tokio::select! {
            output = child.wait_with_output() => output?,
            _ = cancel.cancelled() => return Err(DomainError::Cancelled),
        };

        let stderr = String::from_utf8_lossy(&output.stderr);
        match parse_duration(&stderr) {
            Some(duration) => {
                debug!(path = %path.display(), duration, "Probed duration");
                Ok(duration)
            }
            None => {
                let last_line = stderr
                    .lines()
                    .rev()
                    .map(str::trim)
                    .find(|line| !line.is_empty())
                    .unwrap_or("no output");
                Err(DomainError::Probe(format!(
                    "No duration found for {}: {}",
                    path.display(),
                    last_line
                )))
            }
        }
    }
}
