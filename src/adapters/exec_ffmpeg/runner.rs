//! Transcoder child process supervision

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::progress::ProgressParser;
use crate::domain::errors::DomainError;
use crate::domain::model::EncodeProgress;
use crate::ports::ProgressSink;

/// Size of each read from the transcoder's stderr pipe
const READ_CHUNK: usize = 64 * 1024;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Runs the external transcoder and turns its exit into a domain result
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    program: PathBuf,
}

impl FfmpegRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Command with captured output, no stdin and no console window
    pub(crate) fn command(&self, args: &[String]) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(windows)]
        command.creation_flags(CREATE_NO_WINDOW);
        command
    }

    fn terminate(child: &mut Child) {
        info!("Cancellation requested, terminating transcoder");
        if let Err(e) = child.start_kill() {
            // Already exited on its own
            debug!(error = %e, "Transcoder kill failed");
        }
    }

    /// Run the transcoder to completion.
    ///
    /// Progress is reported for every status line, normalized by
    /// `expected_duration`. Cancelling `cancel` kills the child; an exit code
    /// of zero still wins if the process finished before the kill landed.
    pub async fn run(
        &self,
        args: &[String],
        expected_duration: f64,
        progress: &dyn ProgressSink<EncodeProgress>,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError> {
        if !expected_duration.is_finite() || expected_duration <= 0.0 {
            return Err(DomainError::validation(format!(
                "Expected duration must be positive, got {}",
                expected_duration
            )));
        }
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }

        debug!(program = %self.program.display(), ?args, "Spawning transcoder");
        let mut child = self.command(args).spawn().map_err(|e| DomainError::ProcessFailed {
            reason: format!("Failed to start {}: {}", self.program.display(), e),
        })?;

        let mut stderr = child.stderr.take().ok_or_else(|| DomainError::ProcessFailed {
            reason: "Transcoder stderr was not captured".to_string(),
        })?;

        // Nothing useful arrives on stdout, but a full pipe would stall the child
        if let Some(mut stdout) = child.stdout.take() {
            tokio::spawn(async move {
                let _ = tokio::io::copy(&mut stdout, &mut tokio::io::sink()).await;
            });
        }

        let mut parser = ProgressParser::new(expected_duration);
        let mut buffer = vec![0u8; READ_CHUNK];

        loop {
            tokio::select! {
                read = stderr.read(&mut buffer) => match read {
                    Ok(0) => break,
                    Ok(n) => {
                        for snapshot in parser.feed(&buffer[..n]) {
                            progress.report(snapshot);
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to read transcoder output");
                        break;
                    }
                },
                _ = cancel.cancelled() => {
                    Self::terminate(&mut child);
                    break;
                }
            }
        }

        for snapshot in parser.finish() {
            progress.report(snapshot);
        }

        // The child may close stderr and keep running
        let status = tokio::select! {
            status = child.wait() => status?,
            _ = cancel.cancelled() => {
                Self::terminate(&mut child);
                child.wait().await?
            }
        };
        debug!(%status, "Transcoder exited");

        if status.success() {
            return Ok(());
        }
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        let reason = parser
            .last_diagnostic()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Transcoder exited with {}", status));
        Err(DomainError::ProcessFailed { reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::NoProgress;

    #[tokio::test]
    async fn test_non_positive_duration_rejected_before_spawn() {
        let runner = FfmpegRunner::new("/nonexistent/transcoder");
        let cancel = CancellationToken::new();
        for duration in [0.0, -1.0, f64::NAN] {
            let err = runner.run(&[], duration, &NoProgress, &cancel).await.unwrap_err();
            assert!(err.is_validation(), "{duration}: {err}");
        }
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let runner = FfmpegRunner::new("/nonexistent/transcoder");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = runner.run(&[], 10.0, &NoProgress, &cancel).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_missing_program_is_process_failure() {
        let runner = FfmpegRunner::new("/nonexistent/transcoder");
        let err = runner
            .run(&[], 10.0, &NoProgress, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ProcessFailed { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failure_reason_is_last_diagnostic_line() {
        let runner = FfmpegRunner::new("sh");
        let args = vec![
            "-c".to_string(),
            "echo 'Opening input' >&2; echo 'in.mp4: Invalid data found' >&2; exit 1".to_string(),
        ];
        let err = runner
            .run(&args, 10.0, &NoProgress, &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            DomainError::ProcessFailed { reason } => assert_eq!(reason, "in.mp4: Invalid data found"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_progress_reported_from_stderr() {
        use std::sync::{Arc, Mutex};

        let runner = FfmpegRunner::new("sh");
        let args = vec![
            "-c".to_string(),
            "printf 'frame=1 fps=25 q=1.0 size=1kB time=00:00:05.00 bitrate=1kbits/s\\r' >&2".to_string(),
        ];
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = seen.clone();
        let sink = move |p: EncodeProgress| captured.lock().unwrap().push(p);
        runner
            .run(&args, 10.0, &sink, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![EncodeProgress::new(50, 25)]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancellation_kills_running_child() {
        let runner = FfmpegRunner::new("sh");
        let args = vec!["-c".to_string(), "exec sleep 30".to_string()];
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let err = runner.run(&args, 10.0, &NoProgress, &cancel).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancellation_after_stderr_closed() {
        let runner = FfmpegRunner::new("sh");
        let args = vec!["-c".to_string(), "exec 2>&-; exec sleep 30".to_string()];
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let err = runner.run(&args, 10.0, &NoProgress, &cancel).await.unwrap_err();
        assert!(err.is_cancelled(), "{err}");
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
    }
}
