// TOML config adapter - Configuration loading with layered overrides

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::adapters::upload_form::DEFAULT_FIELD_NAME;
use crate::adapters::upload_video_host::{CHUNK_GRANULARITY, DEFAULT_CHUNK_SIZE};
use crate::domain::errors::*;
use crate::domain::model::Destination;
use crate::utils::path::library_path;

/// Candidate config files, tried in order when none is given explicitly
pub const CONFIG_SEARCH_PATHS: [&str; 2] = ["clipship.toml", "config/clipship.toml"];

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Environment overrides: variable name and the setting it replaces
const ENV_MAPPINGS: [(&str, &str); 9] = [
    ("CLIPSHIP_FFMPEG_PATH", "transcoder.ffmpeg_path"),
    ("CLIPSHIP_LIBRARY_DIR", "output.library_dir"),
    ("CLIPSHIP_TEMP_DIR", "output.temp_dir"),
    ("CLIPSHIP_FORM_URL", "upload.form.url"),
    ("CLIPSHIP_VIDEO_HOST_URL", "upload.video_host.upload_url"),
    ("CLIPSHIP_VIDEO_HOST_TOKEN", "upload.video_host.access_token"),
    ("CLIPSHIP_AUTH_COMMAND", "upload.video_host.auth_command"),
    ("CLIPSHIP_LOG_LEVEL", "logging.level"),
    ("CLIPSHIP_LOG_JSON", "logging.json"),
];

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub transcoder: TranscoderConfig,
    pub output: OutputConfig,
    pub upload: UploadConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscoderConfig {
    /// Program name or path of the ffmpeg executable
    pub ffmpeg_path: PathBuf,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Clip library used by the file destination
    pub library_dir: PathBuf,
    /// Where encodes are written before delivery; the system temp dir if unset
    pub temp_dir: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            library_dir: PathBuf::from("clips"),
            temp_dir: None,
        }
    }
}

impl OutputConfig {
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub form: FormConfig,
    pub video_host: VideoHostConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub url: Option<String>,
    pub field_name: String,
    /// Public location of an uploaded clip, `{name}` is replaced by its file name
    pub share_url: Option<String>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            url: None,
            field_name: DEFAULT_FIELD_NAME.to_string(),
            share_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoHostConfig {
    pub upload_url: String,
    pub chunk_size: usize,
    pub category_id: String,
    pub privacy_status: String,
    pub access_token: Option<String>,
    /// Command printing a bearer token on stdout
    pub auth_command: Option<String>,
    /// Public location of an uploaded video, `{id}` is replaced by its id
    pub share_url: Option<String>,
}

impl Default for VideoHostConfig {
    fn default() -> Self {
        Self {
            upload_url: "https://www.googleapis.com/upload/youtube/v3/videos".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            category_id: "22".to_string(),
            privacy_status: "unlisted".to_string(),
            access_token: None,
            auth_command: None,
            share_url: Some("https://www.youtube.com/watch?v={id}".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml(content: &str) -> Result<Self, DomainError> {
        toml::from_str(content)
            .map_err(|e| DomainError::Config(format!("Failed to parse TOML config: {}", e)))
    }

    /// Load defaults, then the config file, then environment overrides.
    ///
    /// An explicit `path` must exist; otherwise the search paths are tried and
    /// a missing file just means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, DomainError> {
        let mut config = match Self::locate(path)? {
            Some(file) => {
                info!(path = %file.display(), "Loading configuration");
                let content = std::fs::read_to_string(&file).map_err(|e| {
                    DomainError::Config(format!("Failed to read {}: {}", file.display(), e))
                })?;
                Self::from_toml(&content)?
            }
            None => {
                debug!("No configuration file found, using defaults");
                Self::default()
            }
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    fn locate(path: Option<&Path>) -> Result<Option<PathBuf>, DomainError> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(DomainError::Config(format!(
                    "Config file does not exist: {}",
                    path.display()
                )));
            }
            return Ok(Some(path.to_path_buf()));
        }
        Ok(CONFIG_SEARCH_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|candidate| candidate.exists()))
    }

    /// Apply `CLIPSHIP_*` overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for (variable, key) in ENV_MAPPINGS {
            let Some(value) = lookup(variable) else {
                continue;
            };
            debug!(variable, key, "Environment override");
            match key {
                "transcoder.ffmpeg_path" => self.transcoder.ffmpeg_path = PathBuf::from(value),
                "output.library_dir" => self.output.library_dir = PathBuf::from(value),
                "output.temp_dir" => self.output.temp_dir = Some(PathBuf::from(value)),
                "upload.form.url" => self.upload.form.url = Some(value),
                "upload.video_host.upload_url" => self.upload.video_host.upload_url = value,
                "upload.video_host.access_token" => self.upload.video_host.access_token = Some(value),
                "upload.video_host.auth_command" => self.upload.video_host.auth_command = Some(value),
                "logging.level" => self.logging.level = value.to_lowercase(),
                "logging.json" => {
                    self.logging.json = value.parse().map_err(|_| {
                        DomainError::Config(format!("{} must be true or false, got {}", variable, value))
                    })?
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Reject settings that would only fail later, mid-operation
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.transcoder.ffmpeg_path.as_os_str().is_empty() {
            return Err(DomainError::Config("transcoder.ffmpeg_path cannot be empty".to_string()));
        }
        let chunk = self.upload.video_host.chunk_size;
        if chunk == 0 || chunk % CHUNK_GRANULARITY != 0 {
            return Err(DomainError::Config(format!(
                "upload.video_host.chunk_size must be a non-zero multiple of {}, got {}",
                CHUNK_GRANULARITY, chunk
            )));
        }
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(DomainError::Config(format!(
                "Invalid log level: {}. Valid levels: {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }
        if self.upload.form.field_name.trim().is_empty() {
            return Err(DomainError::Config("upload.form.field_name cannot be empty".to_string()));
        }
        Ok(())
    }

    /// User-facing location of a delivered clip, when one is known
    pub fn share_location(
        &self,
        destination: Destination,
        clip_name: &str,
        remote_id: &str,
        library_dir: &Path,
    ) -> Option<String> {
        match destination {
            Destination::File => Some(library_path(library_dir, clip_name).display().to_string()),
            Destination::PrimarySite => self
                .upload
                .form
                .share_url
                .as_ref()
                .map(|template| template.replace("{name}", clip_name)),
            Destination::VideoHost => self
                .upload
                .video_host
                .share_url
                .as_ref()
                .filter(|_| !remote_id.is_empty())
                .map(|template| template.replace("{id}", remote_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.transcoder.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.upload.form.field_name, "uploadedFile");
        assert_eq!(config.upload.video_host.privacy_status, "unlisted");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [output]
            library_dir = "/srv/clips"

            [upload.form]
            url = "https://example.com/up"
            share_url = "https://example.com/videos/{name}"
            "#,
        )
        .unwrap();
        assert_eq!(config.output.library_dir, PathBuf::from("/srv/clips"));
        assert_eq!(config.upload.form.url.as_deref(), Some("https://example.com/up"));
        assert_eq!(config.upload.form.field_name, "uploadedFile");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = AppConfig::from_toml("[output\nlibrary_dir=").unwrap_err();
        assert!(matches!(err, DomainError::Config(_)));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = AppConfig::from_toml("[logging]\nlevel = \"warn\"").unwrap();
        let env: HashMap<&str, &str> = [
            ("CLIPSHIP_LOG_LEVEL", "DEBUG"),
            ("CLIPSHIP_LOG_JSON", "true"),
            ("CLIPSHIP_FFMPEG_PATH", "/opt/ffmpeg/bin/ffmpeg"),
            ("CLIPSHIP_VIDEO_HOST_TOKEN", "secret"),
        ]
        .into_iter()
        .collect();
        config
            .apply_env(|name| env.get(name).map(|value| value.to_string()))
            .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert_eq!(config.transcoder.ffmpeg_path, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(config.upload.video_host.access_token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_env_rejects_bad_boolean() {
        let mut config = AppConfig::default();
        let result = config.apply_env(|name| (name == "CLIPSHIP_LOG_JSON").then(|| "yes".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        config.upload.video_host.chunk_size = 1000;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.transcoder.ffmpeg_path = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_missing_file_fails() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/clipship.toml"))).unwrap_err();
        assert!(matches!(err, DomainError::Config(_)));
    }

    #[test]
    fn test_share_locations() {
        let mut config = AppConfig::default();
        config.upload.form.share_url = Some("https://example.com/videos/{name}".to_string());

        assert_eq!(
            config.share_location(Destination::PrimarySite, "goal.mp4", "", Path::new("/out")),
            Some("https://example.com/videos/goal.mp4".to_string())
        );
        assert_eq!(
            config.share_location(Destination::VideoHost, "goal.mp4", "abc123", Path::new("/out")),
            Some("https://www.youtube.com/watch?v=abc123".to_string())
        );
        assert_eq!(
            config.share_location(Destination::VideoHost, "goal.mp4", "", Path::new("/out")),
            None
        );
        assert_eq!(
            config.share_location(Destination::File, "goal.mp4", "", Path::new("/out")),
            Some(Path::new("/out").join("goal.mp4").display().to_string())
        );
    }
}
