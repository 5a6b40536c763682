use crate::controller::DialogTimeouts;
use crate::defaults;
use crate::error::{AnswerboxError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub service: ServiceConfig,
    pub dialog: DialogConfig,
    pub identity: IdentityConfig,
}

/// Audio device selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AudioConfig {
    pub input_device: Option<String>,
    pub output_device: Option<String>,
}

/// Remote recognition/synthesis service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    pub language: String,
    pub sensitivity: f32,
    pub word_confidence: f32,
    pub face_confidence: f32,
    pub request_timeout_secs: u64,
}

/// Conversation timeouts and attempt budgets
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DialogConfig {
    pub identify_timeout_secs: u64,
    pub confirm_timeout_secs: u64,
    pub confirm_attempts: u32,
    pub recipient_timeout_secs: u64,
    pub recipient_attempts: u32,
    pub message_timeout_secs: u64,
}

/// Known identities and camera access
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IdentityConfig {
    /// Directory with one subdirectory of reference images per person.
    pub ids_dir: PathBuf,
    pub camera_url: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            language: defaults::LANGUAGE.to_string(),
            sensitivity: defaults::REQUEST_SENSITIVITY,
            word_confidence: defaults::WORD_CONFIDENCE,
            face_confidence: defaults::FACE_CONFIDENCE,
            request_timeout_secs: defaults::RPC_TIMEOUT.as_secs(),
        }
    }
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            identify_timeout_secs: defaults::IDENTIFY_TIMEOUT.as_secs(),
            confirm_timeout_secs: defaults::CONFIRM_TIMEOUT.as_secs(),
            confirm_attempts: defaults::CONFIRM_ATTEMPTS,
            recipient_timeout_secs: defaults::RECIPIENT_TIMEOUT.as_secs(),
            recipient_attempts: defaults::RECIPIENT_ATTEMPTS,
            message_timeout_secs: defaults::MESSAGE_TIMEOUT.as_secs(),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            ids_dir: PathBuf::from("ids"),
            camera_url: None,
        }
    }
}

impl DialogConfig {
    pub fn timeouts(&self) -> DialogTimeouts {
        DialogTimeouts {
            identify: Duration::from_secs(self.identify_timeout_secs),
            confirm: Duration::from_secs(self.confirm_timeout_secs),
            confirm_attempts: self.confirm_attempts,
            recipient: Duration::from_secs(self.recipient_timeout_secs),
            recipient_attempts: self.recipient_attempts,
            message: Duration::from_secs(self.message_timeout_secs),
        }
    }
}

impl ServiceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file is missing or contains invalid TOML.
    /// Missing fields use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AnswerboxError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                AnswerboxError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults only when the file does
    /// not exist. Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(AnswerboxError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - ANSWERBOX_SERVICE_URL → service.base_url
    /// - ANSWERBOX_LANGUAGE → service.language
    /// - ANSWERBOX_IDS_DIR → identity.ids_dir
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("ANSWERBOX_SERVICE_URL")
            && !url.is_empty()
        {
            self.service.base_url = url;
        }

        if let Ok(language) = std::env::var("ANSWERBOX_LANGUAGE")
            && !language.is_empty()
        {
            self.service.language = language;
        }

        if let Ok(ids_dir) = std::env::var("ANSWERBOX_IDS_DIR")
            && !ids_dir.is_empty()
        {
            self.identity.ids_dir = PathBuf::from(ids_dir);
        }

        self
    }

    /// Default configuration file path, relative to the working directory.
    pub fn default_path() -> PathBuf {
        PathBuf::from("answerbox.toml")
    }
}
