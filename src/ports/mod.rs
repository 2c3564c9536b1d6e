// Ports - Interface definitions (contracts)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Receiver of progress snapshots
///
/// The core pushes values without assuming any threading model; a sink that
/// needs to marshal onto another thread does so itself.
pub trait ProgressSink<T>: Send + Sync {
    fn report(&self, progress: T);
}

impl<T, F> ProgressSink<T> for F
where
    F: Fn(T) + Send + Sync,
{
    fn report(&self, progress: T) {
        self(progress)
    }
}

impl<T: Send> ProgressSink<T> for UnboundedSender<T> {
    fn report(&self, progress: T) {
        // A dropped receiver just means nobody is watching anymore
        let _ = self.send(progress);
    }
}

/// Sink that discards every report
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl<T> ProgressSink<T> for NoProgress {
    fn report(&self, _progress: T) {}
}

/// Shared handle to a progress sink
pub type SharedSink<T> = Arc<dyn ProgressSink<T>>;

/// Port for producing an encoded clip
#[async_trait]
pub trait EncodePort: Send + Sync {
    /// Cut `timelines` out of `source` into `output`
    #[allow(clippy::too_many_arguments)]
    async fn encode_timelines(
        &self,
        source: &Path,
        output: &Path,
        timelines: &[Timeline],
        kind: EncoderKind,
        force_widescreen: bool,
        progress: SharedSink<EncodeProgress>,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError>;

    /// Join whole `files`, in order, into `output`
    async fn encode_files(
        &self,
        files: &[PathBuf],
        output: &Path,
        kind: EncoderKind,
        force_widescreen: bool,
        progress: SharedSink<EncodeProgress>,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError>;
}

/// Port for delivering a finished clip
///
/// Implementations never delete or rename `local_path` unless delivering it
/// is itself a move; on failure the file is left for the caller to clean up.
#[async_trait]
pub trait UploadPort: Send + Sync {
    /// Deliver `local_path` under `desired_name`, returning the remote id
    /// (empty when the destination has none)
    async fn upload(
        &self,
        local_path: &Path,
        desired_name: &str,
        progress: SharedSink<UploadProgress>,
        cancel: &CancellationToken,
    ) -> Result<String, DomainError>;
}

/// Port for media duration discovery
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Duration of `path` in seconds
    async fn probe_duration(&self, path: &Path, cancel: &CancellationToken) -> Result<f64, DomainError>;
}
