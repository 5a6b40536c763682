//! The kiosk's voice: synthesize a line and play it synchronously.

use crate::artifact::AudioArtifact;
use crate::audio::playback::AudioOutput;
use crate::audio::segment::AudioSegment;
use crate::dialog::phrases;
use crate::error::{AnswerboxError, Result};
use crate::service::SpeechSynth;
use rand::seq::SliceRandom;

pub struct Speaker {
    synth: Box<dyn SpeechSynth>,
    output: Box<dyn AudioOutput>,
    lang: String,
}

impl Speaker {
    pub fn new(synth: Box<dyn SpeechSynth>, output: Box<dyn AudioOutput>, lang: &str) -> Self {
        Self {
            synth,
            output,
            lang: lang.to_string(),
        }
    }

    /// Speak one line and block until playback finishes. Empty text is a
    /// no-op. A synthesizer outage is logged and swallowed so the
    /// conversation can limp on without a voice.
    pub fn say(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let wav = match self.synth.synthesize(text, &self.lang) {
            Ok(wav) => wav,
            Err(AnswerboxError::Service { message }) => {
                eprintln!("answerbox: speech synthesis failed, staying mute: {message}");
                return Ok(());
            }
            Err(other) => return Err(other),
        };
        let segment = AudioSegment::from_wav_bytes(&wav)?;
        self.output.play(&segment)
    }

    /// Pick a random opener.
    pub fn greet(&mut self) -> Result<()> {
        let line = phrases::INTROS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("Hello !");
        self.say(line)
    }

    pub fn reprompt(&mut self) -> Result<()> {
        self.say(phrases::REPROMPT)
    }

    pub fn play_segment(&mut self, segment: &AudioSegment) -> Result<()> {
        self.output.play(segment)
    }

    /// Play back a recorded WAV artifact.
    pub fn play_artifact(&mut self, artifact: &AudioArtifact) -> Result<()> {
        let segment = AudioSegment::read_wav(artifact.path())?;
        self.output.play(&segment)
    }
}
