//! Word-spotting sessions: the bridge between live capture and the remote
//! spotter.
//!
//! A session owns a vocabulary and brackets every listening pass with
//! `enable_session`/`disable_session`, even when recording fails midway.
//! Each drained segment is written to a scratch WAV, resampled to the
//! service rate and submitted; a spotter outage is logged and treated as
//! "nothing heard" so the caller's timeout stays in charge.

use crate::artifact::AudioArtifact;
use crate::audio::ingest::{self, IngestConfig};
use crate::audio::input::AudioInput;
use crate::audio::segment::AudioSegment;
use crate::defaults;
use crate::error::{AnswerboxError, Result};
use crate::resample::{LinearResampler, Resampler};
use crate::service::{VocabularyEntry, WordSpotter};
use std::time::Duration;

pub struct WordSession {
    spotter: Box<dyn WordSpotter>,
    vocabulary: Vec<VocabularyEntry>,
    lang: String,
    sensitivity: f32,
    confidence: f32,
    resampler: Box<dyn Resampler>,
    ingest: IngestConfig,
}

impl WordSession {
    pub fn new(spotter: Box<dyn WordSpotter>, vocabulary: Vec<VocabularyEntry>, lang: &str) -> Self {
        Self {
            spotter,
            vocabulary,
            lang: lang.to_string(),
            sensitivity: defaults::REQUEST_SENSITIVITY,
            confidence: defaults::WORD_CONFIDENCE,
            resampler: Box::new(LinearResampler),
            ingest: IngestConfig::default(),
        }
    }

    pub fn with_tuning(mut self, sensitivity: f32, confidence: f32) -> Self {
        self.sensitivity = sensitivity;
        self.confidence = confidence;
        self
    }

    pub fn with_resampler(mut self, resampler: Box<dyn Resampler>) -> Self {
        self.resampler = resampler;
        self
    }

    pub fn with_ingest_config(mut self, config: IngestConfig) -> Self {
        self.ingest = config;
        self
    }

    /// Listen for one vocabulary word. Returns the spotted label, or None
    /// when the timeout elapses without a confident hit.
    pub fn ask(&mut self, input: &mut dyn AudioInput, timeout: Duration) -> Result<Option<String>> {
        self.spotter.enable_session(&self.vocabulary, &self.lang)?;

        let spotter = &mut self.spotter;
        let resampler = self.resampler.as_ref();
        let sensitivity = self.sensitivity;
        let confidence = self.confidence;

        let outcome = ingest::record(input, &self.ingest, timeout, |segment| {
            submit_segment(spotter.as_mut(), resampler, segment, sensitivity, confidence)
        });
        let disabled = self.spotter.disable_session();

        let spotted = outcome?;
        disabled?;
        Ok(spotted)
    }

    /// Record a free-form message until the stop word is heard or `timeout`
    /// elapses. Everything captured (stop word included) is kept, at the
    /// input's native format. Returns None when nothing was captured at all.
    pub fn record_until_stop(
        &mut self,
        input: &mut dyn AudioInput,
        timeout: Duration,
    ) -> Result<Option<AudioArtifact>> {
        self.spotter.enable_session(&self.vocabulary, &self.lang)?;

        let spotter = &mut self.spotter;
        let resampler = self.resampler.as_ref();
        let sensitivity = self.sensitivity;
        let confidence = self.confidence;
        let mut collected: Vec<AudioSegment> = Vec::new();

        let outcome = ingest::record(input, &self.ingest, timeout, |segment| {
            collected.push(segment.clone());
            let stopped =
                submit_segment(spotter.as_mut(), resampler, segment, sensitivity, confidence)?;
            Ok(stopped.map(|_| ()))
        });
        let disabled = self.spotter.disable_session();

        outcome?;
        disabled?;

        let Some(recording) = AudioSegment::concat(&collected) else {
            return Ok(None);
        };
        let artifact = AudioArtifact::create("answerbox-message")?;
        recording.write_wav(artifact.path())?;
        Ok(Some(artifact))
    }
}

/// Submit one segment to the spotter: scratch WAV, resample to the service
/// rate, spot, threshold. A spotter failure is logged and yields None so the
/// session keeps listening.
fn submit_segment(
    spotter: &mut dyn WordSpotter,
    resampler: &dyn Resampler,
    segment: &AudioSegment,
    sensitivity: f32,
    confidence: f32,
) -> Result<Option<String>> {
    let raw = AudioArtifact::create("answerbox-raw")?;
    segment.write_wav(raw.path())?;

    let prepared = AudioArtifact::create("answerbox-16k")?;
    resampler.resample_file(raw.path(), prepared.path(), defaults::SERVICE_SAMPLE_RATE)?;
    let wav = std::fs::read(prepared.path())?;

    match spotter.spot(&wav, sensitivity) {
        // Only the top-ranked candidate counts, and the floor is strict.
        Ok(candidates) => Ok(candidates
            .into_iter()
            .next()
            .filter(|c| c.confidence > confidence)
            .map(|c| c.words)),
        Err(AnswerboxError::Service { message }) => {
            eprintln!("answerbox: word spotting failed, still listening: {message}");
            Ok(None)
        }
        Err(other) => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::input::MockAudioInput;
    use crate::service::{MockWordSpotter, SpotCandidate, vocabulary};

    fn fast_ingest() -> IngestConfig {
        IngestConfig {
            poll_interval: Duration::from_millis(5),
            max_pending_chunks: 3,
        }
    }

    fn chatty_input() -> MockAudioInput {
        MockAudioInput::new()
            .with_chunks(vec![vec![100i16; 320]])
            .with_chunk_interval(Duration::from_millis(2))
            .cycling()
    }

    fn candidate(words: &str, confidence: f32) -> SpotCandidate {
        SpotCandidate {
            words: words.to_string(),
            confidence,
        }
    }

    #[test]
    fn ask_returns_confident_word_and_balances_brackets() {
        let spotter = MockWordSpotter::new().with_replies(vec![
            vec![],
            vec![candidate("yes", 0.4), candidate("no", 0.05)],
        ]);
        let handle = spotter.clone();
        let mut session = WordSession::new(Box::new(spotter), vocabulary(&["yes", "no"]), "en-US")
            .with_ingest_config(fast_ingest());

        let mut input = chatty_input();
        let word = session.ask(&mut input, Duration::from_secs(2)).unwrap();

        assert_eq!(word.as_deref(), Some("yes"));
        assert_eq!(handle.enable_count(), 1);
        assert_eq!(handle.disable_count(), 1);
        assert_eq!(input.stop_count(), 1);
    }

    #[test]
    fn ask_never_takes_a_confident_runner_up() {
        // The reply is ranked; a lower-ranked candidate above the floor must
        // not outrank an uncertain top one.
        let spotter = MockWordSpotter::new()
            .with_replies(vec![vec![candidate("yes", 0.05), candidate("no", 0.9)]]);
        let mut session = WordSession::new(Box::new(spotter), vocabulary(&["yes", "no"]), "en-US")
            .with_ingest_config(fast_ingest());

        let mut input = chatty_input();
        let word = session.ask(&mut input, Duration::from_millis(60)).unwrap();

        assert!(word.is_none());
    }

    #[test]
    fn ask_rejects_a_word_at_the_exact_confidence_floor() {
        let spotter = MockWordSpotter::new()
            .with_replies(vec![vec![candidate("yes", defaults::WORD_CONFIDENCE)]]);
        let mut session = WordSession::new(Box::new(spotter), vocabulary(&["yes"]), "en-US")
            .with_ingest_config(fast_ingest());

        let mut input = chatty_input();
        let word = session.ask(&mut input, Duration::from_millis(60)).unwrap();

        assert!(word.is_none());
    }

    #[test]
    fn ask_ignores_candidates_below_the_confidence_floor() {
        let spotter = MockWordSpotter::new().with_replies(vec![vec![candidate("yes", 0.05)]]);
        let handle = spotter.clone();
        let mut session = WordSession::new(Box::new(spotter), vocabulary(&["yes"]), "en-US")
            .with_ingest_config(fast_ingest());

        let mut input = chatty_input();
        let word = session.ask(&mut input, Duration::from_millis(60)).unwrap();

        assert!(word.is_none());
        assert!(handle.spot_count() >= 1);
        assert_eq!(handle.enable_count(), handle.disable_count());
    }

    #[test]
    fn ask_keeps_listening_through_a_spotter_outage() {
        let spotter = MockWordSpotter::new()
            .with_error("service unavailable")
            .with_replies(vec![vec![candidate("no", 0.9)]]);
        let handle = spotter.clone();
        let mut session = WordSession::new(Box::new(spotter), vocabulary(&["no"]), "en-US")
            .with_ingest_config(fast_ingest());

        let mut input = chatty_input();
        let word = session.ask(&mut input, Duration::from_secs(2)).unwrap();

        assert_eq!(word.as_deref(), Some("no"));
        assert_eq!(handle.spot_count(), 2);
        assert_eq!(handle.disable_count(), 1);
    }

    #[test]
    fn ask_disables_session_when_capture_start_fails() {
        let spotter = MockWordSpotter::new();
        let handle = spotter.clone();
        let mut session = WordSession::new(Box::new(spotter), vocabulary(&["yes"]), "en-US")
            .with_ingest_config(fast_ingest());

        let mut input = MockAudioInput::new().with_start_failure();
        assert!(session.ask(&mut input, Duration::from_millis(20)).is_err());
        assert_eq!(handle.enable_count(), 1);
        assert_eq!(handle.disable_count(), 1);
    }

    #[test]
    fn record_until_stop_keeps_audio_heard_before_the_stop_word() {
        let spotter =
            MockWordSpotter::new().with_replies(vec![vec![], vec![], vec![candidate("stop", 0.8)]]);
        let handle = spotter.clone();
        let mut session = WordSession::new(Box::new(spotter), vocabulary(&["stop"]), "en-US")
            .with_ingest_config(fast_ingest());

        let mut input = chatty_input();
        let artifact = session
            .record_until_stop(&mut input, Duration::from_secs(2))
            .unwrap()
            .expect("a recording");

        let recording = AudioSegment::read_wav(artifact.path()).unwrap();
        assert!(recording.len() >= 3 * 320);
        assert_eq!(handle.enable_count(), handle.disable_count());
    }

    #[test]
    fn record_until_stop_with_silent_input_yields_nothing() {
        let spotter = MockWordSpotter::new();
        let mut session = WordSession::new(Box::new(spotter), vocabulary(&["stop"]), "en-US")
            .with_ingest_config(fast_ingest());

        // Input that produces no chunks at all.
        let mut input = MockAudioInput::new().with_chunks(vec![]);
        let artifact = session
            .record_until_stop(&mut input, Duration::from_millis(40))
            .unwrap();
        assert!(artifact.is_none());
    }
}
