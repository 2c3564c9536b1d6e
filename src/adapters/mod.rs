// Adapters - External system implementations

pub mod exec_ffmpeg;
pub mod fs_local;
pub mod toml_config;
pub mod tracing_log;
pub mod upload_form;
pub mod upload_video_host;

// Re-export adapters
pub use exec_ffmpeg::{FfmpegEncoder, FfmpegProbe, FfmpegRunner};
pub use fs_local::LocalFileDestination;
pub use toml_config::AppConfig;
pub use tracing_log::init_logging;
pub use upload_form::FormUploader;
pub use upload_video_host::VideoHostUploader;
