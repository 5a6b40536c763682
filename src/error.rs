//! Error types for answerbox.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnswerboxError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Device errors (fatal at startup)
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Video device not available: {device}")]
    VideoDeviceNotFound { device: String },

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    #[error("Audio playback failed: {message}")]
    AudioPlayback { message: String },

    // Remote recognition/synthesis service errors
    #[error("Recognition service error: {message}")]
    Service { message: String },

    // Session protocol misuse is a programmer error, surfaced loudly
    #[error("Session protocol violation: {message}")]
    SessionProtocol { message: String },

    // Artifact handling
    #[error("Audio artifact error: {message}")]
    Artifact { message: String },

    #[error("Resampling failed: {message}")]
    Resample { message: String },

    #[error("WAV format error: {message}")]
    WavFormat { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, AnswerboxError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn audio_device_not_found_display() {
        let error = AnswerboxError::AudioDeviceNotFound {
            device: "hw:3".to_string(),
        };
        assert_eq!(error.to_string(), "Audio device not found: hw:3");
    }

    #[test]
    fn service_error_display() {
        let error = AnswerboxError::Service {
            message: "word_spotting returned 503".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Recognition service error: word_spotting returned 503"
        );
    }

    #[test]
    fn session_protocol_display() {
        let error = AnswerboxError::SessionProtocol {
            message: "enable_session called twice".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Session protocol violation: enable_session called twice"
        );
    }

    #[test]
    fn from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: AnswerboxError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn from_toml_error() {
        let toml_error = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let error: AnswerboxError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn error_source_chain_io() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let error: AnswerboxError = io_error.into();
        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_some());
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<AnswerboxError>();
        assert_sync::<AnswerboxError>();
    }

    #[test]
    fn result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().ok(), Some(42));
    }
}
