// Form upload destination - streaming multipart POST to the primary site

use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::errors::*;
use crate::domain::model::UploadProgress;
use crate::ports::*;

/// Bytes read from disk and handed to the transport per progress sample
pub const UPLOAD_CHUNK: usize = 80 * 1024;

/// Default multipart field carrying the file
pub const DEFAULT_FIELD_NAME: &str = "uploadedFile";

/// Posts the clip as a single `application/octet-stream` multipart part
pub struct FormUploader {
    client: Client,
    url: String,
    field_name: String,
}

impl FormUploader {
    pub fn new(url: impl Into<String>, field_name: impl Into<String>) -> Result<Self, DomainError> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, url, field_name))
    }

    pub fn with_client(client: Client, url: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            field_name: field_name.into(),
        }
    }

    /// File part whose body samples progress as each chunk is pulled
    async fn file_part(
        local_path: &Path,
        desired_name: &str,
        progress: SharedSink<UploadProgress>,
    ) -> Result<Part, DomainError> {
        let file = File::open(local_path).await?;
        let total = file.metadata().await?.len();
        let started = Instant::now();
        let mut sent: u64 = 0;

        let stream = ReaderStream::with_capacity(file, UPLOAD_CHUNK).map(move |chunk| {
            if let Ok(bytes) = &chunk {
                sent += bytes.len() as u64;
                progress.report(UploadProgress::from_transfer(sent, total, started.elapsed()));
            }
            chunk
        });

        let part = Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(desired_name.to_string())
            .mime_str("application/octet-stream")?;
        Ok(part)
    }
}

#[async_trait]
impl UploadPort for FormUploader {
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

        let part = Self::file_part(local_path, desired_name, progress).await?;
        let form = Form::new().part(self.field_name.clone(), part);

        debug!(url = %self.url, name = desired_name, "Starting form upload");
        let request = self.client.post(&self.url).multipart(form).send();
        let response = tokio::select! {
            response = request => response?,
            _ = cancel.cancelled() => return Err(DomainError::Cancelled),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::upload(format!("Server responded with {}", status)));
        }
        info!(url = %self.url, name = desired_name, "Form upload complete");
        Ok(String::new())
    }
}
