//! answerbox - face-aware voice answering machine kiosk
//!
//! Watches a camera for known visitors, delivers their recorded messages and
//! takes new ones, all through a remote word-spotting/face-recognition/TTS
//! service.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod artifact;
pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod controller;
pub mod defaults;
pub mod dialog;
pub mod error;
pub mod face;
pub mod mailbox;
pub mod resample;
pub mod service;
pub mod session;

// Composition root - needs everything
#[cfg(all(feature = "cpal-audio", feature = "http-service", feature = "cli"))]
pub mod app;

// Core traits (capture → recognize → speak)
pub use audio::input::AudioInput;
pub use audio::playback::AudioOutput;
pub use face::FrameSource;
pub use resample::Resampler;
pub use service::{FaceMatcher, SpeechSynth, WordSpotter};

// Conversation machinery
pub use controller::{ConversationController, DialogTimeouts};
pub use dialog::{Intent, Speaker};
pub use face::FaceIdentifier;
pub use mailbox::{Mailbox, Message};
pub use session::WordSession;

// Error handling
pub use error::{AnswerboxError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }

    #[test]
    fn version_string_contains_plus_when_git_hash_present() {
        let ver = version_string();
        if option_env!("GIT_HASH").is_some_and(|h| !h.is_empty()) {
            assert!(
                ver.contains('+'),
                "With GIT_HASH set, version should contain '+', got: {}",
                ver
            );
        }
    }
}
