//! Synchronous audio playback.
//!
//! Playback is pull-model: the hardware output callback reads frames from
//! the decoded segment on demand, and `play` blocks until the stream
//! reports no further activity.

use crate::audio::segment::AudioSegment;
use crate::error::{AnswerboxError, Result};
use std::sync::{Arc, Mutex};

/// Trait for audio output devices.
pub trait AudioOutput: Send {
    /// Play the segment to completion. Blocks until the hardware stream is
    /// exhausted; an unreadable source is an error, never a partial play.
    fn play(&mut self, segment: &AudioSegment) -> Result<()>;
}

/// Mock audio output for testing: records everything played.
#[derive(Clone, Default)]
pub struct MockAudioOutput {
    played: Arc<Mutex<Vec<AudioSegment>>>,
    should_fail: bool,
}

impl MockAudioOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the mock to fail on play.
    pub fn with_play_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Segments played so far, in order.
    pub fn played(&self) -> Vec<AudioSegment> {
        self.played.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Shared handle to the play log, usable after the mock is boxed.
    pub fn play_log(&self) -> Arc<Mutex<Vec<AudioSegment>>> {
        Arc::clone(&self.played)
    }
}

impl AudioOutput for MockAudioOutput {
    fn play(&mut self, segment: &AudioSegment) -> Result<()> {
        if self.should_fail {
            return Err(AnswerboxError::AudioPlayback {
                message: "mock playback error".to_string(),
            });
        }
        if let Ok(mut played) = self.played.lock() {
            played.push(segment.clone());
        }
        Ok(())
    }
}
