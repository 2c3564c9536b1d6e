// Video host destination - resumable chunked upload with delegated authorization

use std::io::SeekFrom;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_RANGE, LOCATION, RANGE};
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::errors::*;
use crate::domain::model::UploadProgress;
use crate::ports::*;

pub mod auth;

pub use auth::{Authorizer, CommandAuthorizer, StaticToken};

/// Chunk sizes must be a multiple of this
pub const CHUNK_GRANULARITY: usize = 256 * 1024;

/// Default chunk size for the resumable session
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Metadata record that opens the resumable session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoMetadata {
    pub snippet: Snippet,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub title: String,
    pub description: String,
    pub category_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub privacy_status: String,
}

impl VideoMetadata {
    /// Title and description are both the clip name
    pub fn for_clip(name: &str, category_id: &str, privacy_status: &str) -> Self {
        Self {
            snippet: Snippet {
                title: name.to_string(),
                description: name.to_string(),
                category_id: category_id.to_string(),
            },
            status: Status {
                privacy_status: privacy_status.to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadedVideo {
    id: String,
}

/// Settings of the video host endpoint
#[derive(Debug, Clone)]
pub struct VideoHostSettings {
    pub upload_url: String,
    pub chunk_size: usize,
    pub category_id: String,
    pub privacy_status: String,
}

/// Resumable upload: open a session, then `PUT` the file chunk by chunk
/// until the host answers with the created video
pub struct VideoHostUploader {
    client: Client,
    settings: VideoHostSettings,
    authorizer: Arc<dyn Authorizer>,
}

impl VideoHostUploader {
    pub fn new(settings: VideoHostSettings, authorizer: Arc<dyn Authorizer>) -> Result<Self, DomainError> {
        if settings.chunk_size == 0 || settings.chunk_size % CHUNK_GRANULARITY != 0 {
            return Err(DomainError::Config(format!(
                "Video host chunk size must be a non-zero multiple of {} bytes, got {}",
                CHUNK_GRANULARITY, settings.chunk_size
            )));
        }
        // 308 is the protocol's "resume incomplete", never a redirect to follow
        let client = Client::builder().redirect(Policy::none()).build()?;
        Ok(Self {
            client,
            settings,
            authorizer,
        })
    }

    async fn open_session(
        &self,
        token: &str,
        total: u64,
        metadata: &VideoMetadata,
    ) -> Result<Url, DomainError> {
        let base = Url::parse(&self.settings.upload_url)
            .map_err(|e| DomainError::Config(format!("Invalid video host URL: {}", e)))?;

        let response = self
            .client
            .post(base.clone())
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(token)
            .header("X-Upload-Content-Length", total)
            .header("X-Upload-Content-Type", "video/*")
            .json(metadata)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::upload(format!(
                "Video host refused the upload session ({}): {}",
                status,
                body.trim()
            )));
        }

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| DomainError::upload("Video host did not return an upload session"))?;
        base.join(location)
            .map_err(|e| DomainError::upload(format!("Invalid upload session URL: {}", e)))
    }

    async fn send_chunks(
        &self,
        session: Url,
        token: &str,
        local_path: &Path,
        total: u64,
        progress: &dyn ProgressSink<UploadProgress>,
    ) -> Result<String, DomainError> {
        let mut file = File::open(local_path).await?;
        let started = Instant::now();
        let mut offset: u64 = 0;

        loop {
            let end = (offset + self.settings.chunk_size as u64).min(total);
            let mut chunk = vec![0u8; (end - offset) as usize];
            file.seek(SeekFrom::Start(offset)).await?;
            file.read_exact(&mut chunk).await?;

            debug!(offset, end, total, "Sending chunk");
            let response = self
                .client
                .put(session.clone())
                .bearer_auth(token)
                .header(CONTENT_LENGTH, end - offset)
                .header(CONTENT_RANGE, format!("bytes {}-{}/{}", offset, end - 1, total))
                .body(chunk)
                .send()
                .await?;

            match response.status() {
                StatusCode::OK | StatusCode::CREATED => {
                    progress.report(UploadProgress::from_transfer(total, total, started.elapsed()));
                    let video: UploadedVideo = response.json().await?;
                    return Ok(video.id);
                }
                StatusCode::PERMANENT_REDIRECT => {
                    let acknowledged = response
                        .headers()
                        .get(RANGE)
                        .and_then(|value| value.to_str().ok())
                        .and_then(next_offset)
                        .unwrap_or(0);
                    // A chunk that moved nothing forward would be resent forever
                    if acknowledged <= offset {
                        return Err(DomainError::upload(format!(
                            "Video host did not acknowledge any progress past byte {}",
                            offset
                        )));
                    }
                    offset = acknowledged;
                    if offset >= total {
                        return Err(DomainError::upload(
                            "Video host acknowledged every byte without creating the video",
                        ));
                    }
                    progress.report(UploadProgress::from_transfer(offset, total, started.elapsed()));
                }
                status => {
                    let body = response.text().await.unwrap_or_default();
                    return Err(DomainError::upload(format!(
                        "Video host rejected chunk at {} ({}): {}",
                        offset,
                        status,
                        body.trim()
                    )));
                }
            }
        }
    }
}

/// Offset to resume from given a `Range: bytes=0-N` acknowledgement
pub fn next_offset(range: &str) -> Option<u64> {
    let (_, last) = range.trim().strip_prefix("bytes=")?.split_once('-')?;
    last.trim().parse::<u64>().ok().map(|last| last + 1)
}

#[async_trait]
impl UploadPort for VideoHostUploader {
    async fn upload(
        &self,
        local_path: &Path,
        desired_name: &str,
        progress: SharedSink<UploadProgress>,
        cancel: &CancellationToken,
    ) -> Result<String, DomainError> {
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }

        let total = tokio::fs::metadata(local_path).await?.len();
        if total == 0 {
            return Err(DomainError::upload("Refusing to upload an empty file"));
        }

        let token = self.authorizer.access_token(cancel).await?;
        let metadata = VideoMetadata::for_clip(
            desired_name,
            &self.settings.category_id,
            &self.settings.privacy_status,
        );

        let upload = async {
            let session = self.open_session(&token, total, &metadata).await?;
            debug!(session = %session, "Upload session opened");
            self.send_chunks(session, &token, local_path, total, progress.as_ref())
                .await
        };

        // Dropping the in-flight request aborts it
        let id = tokio::select! {
            result = upload => result?,
            _ = cancel.cancelled() => return Err(DomainError::Cancelled),
        };
        info!(id = %id, name = desired_name, "Video host upload complete");
        Ok(id)
    }
}
