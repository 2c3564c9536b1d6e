use std::sync::Arc;

use tracing::debug;

use crate::adapters::toml_config::AppConfig;
use crate::adapters::upload_video_host::{
    Authorizer, CommandAuthorizer, StaticToken, VideoHostSettings,
};
use crate::adapters::{FfmpegEncoder, FfmpegProbe, FfmpegRunner, FormUploader, VideoHostUploader};
use crate::app::clip_interactor::ClipInteractor;
use crate::domain::errors::DomainError;
use crate::ports::{EncodePort, ProbePort, UploadPort};

pub trait AppContainer: Send + Sync {
    fn clip_interactor(&self) -> Arc<ClipInteractor>;
    fn probe_port(&self) -> Arc<dyn ProbePort>;
    fn config(&self) -> &AppConfig;
}

/// Wires the ffmpeg and HTTP adapters from configuration
pub struct DefaultAppContainer {
    config: AppConfig,
    clip_interactor: Arc<ClipInteractor>,
    probe_port: Arc<dyn ProbePort>,
}

impl DefaultAppContainer {
    pub fn new(config: AppConfig) -> Result<Self, DomainError> {
        config.validate()?;

        let runner = FfmpegRunner::new(&config.transcoder.ffmpeg_path);
        let probe_port: Arc<dyn ProbePort> = Arc::new(FfmpegProbe::new(runner.clone()));
        let encode_port: Arc<dyn EncodePort> =
            Arc::new(FfmpegEncoder::new(runner, Arc::clone(&probe_port)));

        let mut interactor = ClipInteractor::new(encode_port, config.output.temp_dir());

        if let Some(url) = &config.upload.form.url {
            let uploader: Arc<dyn UploadPort> =
                Arc::new(FormUploader::new(url.as_str(), config.upload.form.field_name.as_str())?);
            interactor = interactor.with_primary_site(uploader);
        } else {
            debug!("No form upload URL configured");
        }

        if let Some(authorizer) = Self::authorizer(&config)? {
            let video_host = &config.upload.video_host;
            let settings = VideoHostSettings {
                upload_url: video_host.upload_url.clone(),
                chunk_size: video_host.chunk_size,
                category_id: video_host.category_id.clone(),
                privacy_status: video_host.privacy_status.clone(),
            };
            let uploader: Arc<dyn UploadPort> = Arc::new(VideoHostUploader::new(settings, authorizer)?);
            interactor = interactor.with_video_host(uploader);
        } else {
            debug!("No video host credentials configured");
        }

        Ok(Self {
            config,
            clip_interactor: Arc::new(interactor),
            probe_port,
        })
    }

    /// A configured token wins over the helper command
    fn authorizer(config: &AppConfig) -> Result<Option<Arc<dyn Authorizer>>, DomainError> {
        let video_host = &config.upload.video_host;
        let authorizer: Arc<dyn Authorizer> = match (&video_host.access_token, &video_host.auth_command) {
            (Some(token), _) => Arc::new(StaticToken::new(token.as_str())),
            (None, Some(command)) => Arc::new(CommandAuthorizer::from_command_line(command)?),
            (None, None) => return Ok(None),
        };
        Ok(Some(authorizer))
    }
}

impl AppContainer for DefaultAppContainer {
    fn clip_interactor(&self) -> Arc<ClipInteractor> {
        Arc::clone(&self.clip_interactor)
    }

    fn probe_port(&self) -> Arc<dyn ProbePort> {
        Arc::clone(&self.probe_port)
    }

    fn config(&self) -> &AppConfig {
        &self.config
    }
}
