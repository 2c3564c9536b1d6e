// Local file destination - moves the finished clip into the clip library

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::errors::*;
use crate::domain::model::UploadProgress;
use crate::ports::*;
use crate::utils::path::library_path;

/// Delivers a clip by moving it under the library directory.
/// The move is the disposition of the temporary file, so no copy is left behind.
/// A move is treated as instantaneous: no progress and no cancellation point.
pub struct LocalFileDestination {
    library_dir: PathBuf,
}

impl LocalFileDestination {
    pub fn new(library_dir: impl Into<PathBuf>) -> Self {
        Self {
            library_dir: library_dir.into(),
        }
    }

    pub fn library_dir(&self) -> &Path {
        &self.library_dir
    }

    /// Where a clip named `desired_name` ends up
    pub fn target_path(&self, desired_name: &str) -> PathBuf {
        library_path(&self.library_dir, desired_name)
    }

    async fn move_file(from: &Path, to: &Path) -> Result<(), DomainError> {
        match fs::rename(from, to).await {
            Ok(()) => Ok(()),
            Err(rename_error) => {
                // Typically a move across file systems
                debug!(error = %rename_error, "Rename failed, copying instead");
                if let Err(copy_error) = fs::copy(from, to).await {
                    let _ = fs::remove_file(to).await;
                    return Err(copy_error.into());
                }
                if let Err(e) = fs::remove_file(from).await {
                    warn!(path = %from.display(), error = %e, "Failed to remove file after copy");
                }
                Ok(())
            }
        }
    }
}

#[async_trait]
impl UploadPort for LocalFileDestination {
    async fn upload(
        &self,
        local_path: &Path,
        desired_name: &str,
        _progress: SharedSink<UploadProgress>,
        _cancel: &CancellationToken,
    ) -> Result<String, DomainError> {
        fs::create_dir_all(&self.library_dir).await?;
        let target = self.target_path(desired_name);
        if fs::try_exists(&target).await? {
            return Err(DomainError::validation(format!(
                "A clip named {} already exists in {}",
                desired_name,
                self.library_dir.display()
            )));
        }

        Self::move_file(local_path, &target).await?;
        info!(path = %target.display(), "Clip saved to library");
        Ok(String::new())
    }
}
