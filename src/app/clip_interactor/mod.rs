// Clip interactor - Orchestrates the encode-then-deliver use case

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::adapters::fs_local::LocalFileDestination;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::ports::*;

/// Temporary encode target, removed when dropped unless it was moved away
struct TempClip {
    path: PathBuf,
}

impl TempClip {
    /// Reserve a process-unique `.mp4` path in `dir`
    fn allocate(dir: &Path) -> Result<Self, DomainError> {
        std::fs::create_dir_all(dir)?;
        let file = tempfile::Builder::new()
            .prefix("clipship-")
            .suffix(".mp4")
            .tempfile_in(dir)?;
        let path = file.into_temp_path().keep().map_err(|e| DomainError::Io(e.error))?;
        debug!(path = %path.display(), "Allocated temporary clip");
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempClip {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed temporary clip"),
            // Moved into the library
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove temporary clip"
            ),
        }
    }
}

/// Current state of one call, with every change logged
struct StateTracker {
    state: ClipState,
}

impl StateTracker {
    fn new() -> Self {
        Self {
            state: ClipState::Idle,
        }
    }

    fn enter(&mut self, next: ClipState) {
        if !ClipStateRules::can_transition(self.state, next) {
            warn!(from = ?self.state, to = ?next, "Unexpected clip state transition");
        }
        info!(from = ?self.state, to = ?next, "Clip state changed");
        self.state = next;
    }

    /// Terminal state matching the outcome of the call
    fn settle<T>(&mut self, result: &Result<T, DomainError>) {
        let terminal = match result {
            Ok(_) => ClipState::Done,
            Err(e) if e.is_cancelled() => ClipState::Cancelled,
            Err(_) => ClipState::Error,
        };
        self.enter(terminal);
    }
}

/// Interactor for the clip-and-deliver use case
///
/// One call encodes into a private temporary file, then hands it to the
/// selected destination. Calls share no mutable state.
pub struct ClipInteractor {
    encode_port: Arc<dyn EncodePort>,
    primary_site: Option<Arc<dyn UploadPort>>,
    video_host: Option<Arc<dyn UploadPort>>,
    temp_dir: PathBuf,
}

impl ClipInteractor {
    /// Create new clip interactor with injected ports
    pub fn new(encode_port: Arc<dyn EncodePort>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            encode_port,
            primary_site: None,
            video_host: None,
            temp_dir: temp_dir.into(),
        }
    }

    /// Backend for `Destination::PrimarySite`
    pub fn with_primary_site(mut self, uploader: Arc<dyn UploadPort>) -> Self {
        self.primary_site = Some(uploader);
        self
    }

    /// Backend for `Destination::VideoHost`
    pub fn with_video_host(mut self, uploader: Arc<dyn UploadPort>) -> Self {
        self.video_host = Some(uploader);
        self
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Encode the request and deliver it.
    ///
    /// Returns the remote id, or an empty string when the destination has
    /// none. The temporary file never outlives the call unless it became the
    /// delivered file.
    pub async fn clip_and_upload(
        &self,
        request: &ClipRequest,
        encode_progress: SharedSink<EncodeProgress>,
        upload_progress: SharedSink<UploadProgress>,
        cancel: &CancellationToken,
    ) -> Result<String, DomainError> {
        let mut state = StateTracker::new();
        let result = self
            .run(request, encode_progress, upload_progress, cancel, &mut state)
            .await;
        state.settle(&result);
        result
    }

    async fn run(
        &self,
        request: &ClipRequest,
        encode_progress: SharedSink<EncodeProgress>,
        upload_progress: SharedSink<UploadProgress>,
        cancel: &CancellationToken,
        state: &mut StateTracker,
    ) -> Result<String, DomainError> {
        let clip_name = ClipName::new(&request.clip_name)?;
        Self::validate(request, &clip_name)?;
        let backend = self.backend(request.destination, &request.library_dir)?;

        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }

        let temp = TempClip::allocate(&self.temp_dir)?;

        state.enter(ClipState::Encoding);
        self.encode(request, temp.path(), encode_progress, cancel).await?;

        let next = match request.destination {
            Destination::File => ClipState::MovingToFile,
            Destination::PrimarySite | Destination::VideoHost => ClipState::Uploading,
        };
        state.enter(next);
        info!(
            destination = %request.destination,
            name = %clip_name,
            "Delivering clip"
        );
        backend
            .upload(temp.path(), clip_name.as_str(), upload_progress, cancel)
            .await
    }

    /// Checks that need no external process
    fn validate(request: &ClipRequest, clip_name: &ClipName) -> Result<(), DomainError> {
        request.source.validate()?;
        match &request.source {
            ClipSource::Timelines { timelines, .. } => {
                EncoderRules::validate_cut(request.encoder, timelines)?
            }
            ClipSource::Files(_) => EncoderRules::validate_join(request.encoder)?,
        }
        // The destination re-checks after encoding in case the name was taken meanwhile
        if request.destination == Destination::File {
            let target = LocalFileDestination::new(&request.library_dir).target_path(clip_name.as_str());
            if target.exists() {
                return Err(DomainError::validation(format!(
                    "A clip named {} already exists in {}",
                    clip_name,
                    request.library_dir.display()
                )));
            }
        }
        Ok(())
    }

    fn backend(&self, destination: Destination, library_dir: &Path) -> Result<Arc<dyn UploadPort>, DomainError> {
        let configured = match destination {
            Destination::File => {
                let local: Arc<dyn UploadPort> = Arc::new(LocalFileDestination::new(library_dir));
                return Ok(local);
            }
            Destination::PrimarySite => self.primary_site.clone(),
            Destination::VideoHost => self.video_host.clone(),
        };
        configured.ok_or_else(|| {
            DomainError::Config(format!("No upload backend configured for {}", destination))
        })
    }

    async fn encode(
        &self,
        request: &ClipRequest,
        output: &Path,
        progress: SharedSink<EncodeProgress>,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError> {
        match &request.source {
            ClipSource::Timelines { source, timelines } => {
                self.encode_port
                    .encode_timelines(
                        source,
                        output,
                        timelines,
                        request.encoder,
                        request.force_widescreen,
                        progress,
                        cancel,
                    )
                    .await
            }
            ClipSource::Files(files) => {
                self.encode_port
                    .encode_files(
                        files,
                        output,
                        request.encoder,
                        request.force_widescreen,
                        progress,
                        cancel,
                    )
                    .await
            }
        }
    }
}
