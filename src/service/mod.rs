//! Interface to the remote recognition/synthesis service.
//!
//! The service is an external collaborator reached over a blocking RPC; the
//! kiosk only depends on these capability-scoped traits. Word spotting and
//! face recognition are session-bound: every `process`-style call must
//! happen inside an `enable_session`/`disable_session` bracket, and the
//! session state is a singleton per connection.

#[cfg(feature = "http-service")]
pub mod http;

use crate::error::{AnswerboxError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One vocabulary label: a word or word sequence the spotter listens for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub words: String,
}

/// Build a vocabulary from plain labels.
pub fn vocabulary(labels: &[&str]) -> Vec<VocabularyEntry> {
    labels
        .iter()
        .map(|&words| VocabularyEntry {
            words: words.to_string(),
        })
        .collect()
}

/// Reference face images per known person, uploaded once per session.
#[derive(Debug, Clone, Default)]
pub struct IdentityAlbum {
    entries: BTreeMap<String, Vec<Vec<u8>>>,
}

impl IdentityAlbum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_image(&mut self, name: &str, image: Vec<u8>) {
        self.entries.entry(name.to_string()).or_default().push(image);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &[Vec<u8>])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Ranked word-spotting candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotCandidate {
    pub words: String,
    pub confidence: f32,
}

/// Ranked identity candidate for the best-detected face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceCandidate {
    pub key: String,
    pub confidence: f32,
}

/// Word-spotting capability.
pub trait WordSpotter: Send {
    /// Open a session with the given vocabulary. Calling this on an already
    /// enabled session is a protocol violation, not a runtime condition.
    fn enable_session(&mut self, vocabulary: &[VocabularyEntry], lang: &str) -> Result<()>;

    fn disable_session(&mut self) -> Result<()>;

    /// Submit one 16kHz mono WAV and get ranked candidates (may be empty).
    fn spot(&mut self, wav: &[u8], sensitivity: f32) -> Result<Vec<SpotCandidate>>;
}

/// Text-to-speech capability. Stateless; returns WAV bytes.
pub trait SpeechSynth: Send {
    fn synthesize(&mut self, text: &str, lang: &str) -> Result<Vec<u8>>;
}

/// Face-recognition capability, configured with an identity album.
pub trait FaceMatcher: Send {
    fn enable_session(&mut self, album: &IdentityAlbum) -> Result<()>;

    fn disable_session(&mut self) -> Result<()>;

    /// Submit one encoded image; candidates for the best face, best first.
    /// Empty when no face was detected.
    fn match_faces(&mut self, image: &[u8]) -> Result<Vec<FaceCandidate>>;
}

fn protocol_violation(message: &str) -> AnswerboxError {
    AnswerboxError::SessionProtocol {
        message: message.to_string(),
    }
}

/// Scripted reply for mock services.
type MockReply<T> = std::result::Result<T, String>;

/// Mock word spotter with scripted per-call replies and bracket counters.
#[derive(Clone, Default)]
pub struct MockWordSpotter {
    replies: Arc<Mutex<VecDeque<MockReply<Vec<SpotCandidate>>>>>,
    enabled: Arc<Mutex<bool>>,
    enables: Arc<AtomicUsize>,
    disables: Arc<AtomicUsize>,
    spots: Arc<AtomicUsize>,
}

impl MockWordSpotter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue candidate lists returned by successive `spot` calls. Once the
    /// script runs out, further calls return no candidates.
    pub fn with_replies(self, replies: Vec<Vec<SpotCandidate>>) -> Self {
        if let Ok(mut queue) = self.replies.lock() {
            queue.extend(replies.into_iter().map(Ok));
        }
        self
    }

    /// Queue a service failure for one `spot` call.
    pub fn with_error(self, message: &str) -> Self {
        if let Ok(mut queue) = self.replies.lock() {
            queue.push_back(Err(message.to_string()));
        }
        self
    }

    pub fn enable_count(&self) -> usize {
        self.enables.load(Ordering::SeqCst)
    }

    pub fn disable_count(&self) -> usize {
        self.disables.load(Ordering::SeqCst)
    }

    pub fn spot_count(&self) -> usize {
        self.spots.load(Ordering::SeqCst)
    }
}

impl WordSpotter for MockWordSpotter {
    fn enable_session(&mut self, _vocabulary: &[VocabularyEntry], _lang: &str) -> Result<()> {
        let mut enabled = self
            .enabled
            .lock()
            .map_err(|_| protocol_violation("mock state poisoned"))?;
        if *enabled {
            return Err(protocol_violation("enable_session while already enabled"));
        }
        *enabled = true;
        self.enables.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn disable_session(&mut self) -> Result<()> {
        let mut enabled = self
            .enabled
            .lock()
            .map_err(|_| protocol_violation("mock state poisoned"))?;
        if !*enabled {
            return Err(protocol_violation("disable_session while not enabled"));
        }
        *enabled = false;
        self.disables.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn spot(&mut self, _wav: &[u8], _sensitivity: f32) -> Result<Vec<SpotCandidate>> {
        if !self.enabled.lock().map(|e| *e).unwrap_or(false) {
            return Err(protocol_violation("spot outside an enabled session"));
        }
        self.spots.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.lock().ok().and_then(|mut q| q.pop_front());
        match reply {
            Some(Ok(candidates)) => Ok(candidates),
            Some(Err(message)) => Err(AnswerboxError::Service { message }),
            None => Ok(Vec::new()),
        }
    }
}

/// Mock speech synthesizer: logs texts, returns a short silent WAV.
#[derive(Clone, Default)]
pub struct MockSpeechSynth {
    spoken: Arc<Mutex<Vec<String>>>,
    should_fail: bool,
}

impl MockSpeechSynth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Shared handle to the synthesized-text log.
    pub fn spoken_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.spoken)
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl SpeechSynth for MockSpeechSynth {
    fn synthesize(&mut self, text: &str, _lang: &str) -> Result<Vec<u8>> {
        if self.should_fail {
            return Err(AnswerboxError::Service {
                message: "mock tts error".to_string(),
            });
        }
        if let Ok(mut spoken) = self.spoken.lock() {
            spoken.push(text.to_string());
        }
        // 10ms of silence at the service rate.
        crate::audio::segment::AudioSegment::new(
            crate::audio::segment::SegmentFormat::mono(16000),
            vec![0i16; 160],
        )
        .to_wav_bytes()
    }
}

/// Mock face matcher with scripted per-call replies and bracket counters.
#[derive(Clone, Default)]
pub struct MockFaceMatcher {
    replies: Arc<Mutex<VecDeque<MockReply<Vec<FaceCandidate>>>>>,
    enabled: Arc<Mutex<bool>>,
    enables: Arc<AtomicUsize>,
    disables: Arc<AtomicUsize>,
    submissions: Arc<AtomicUsize>,
}

impl MockFaceMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(self, replies: Vec<Vec<FaceCandidate>>) -> Self {
        if let Ok(mut queue) = self.replies.lock() {
            queue.extend(replies.into_iter().map(Ok));
        }
        self
    }

    pub fn with_error(self, message: &str) -> Self {
        if let Ok(mut queue) = self.replies.lock() {
            queue.push_back(Err(message.to_string()));
        }
        self
    }

    pub fn enable_count(&self) -> usize {
        self.enables.load(Ordering::SeqCst)
    }

    pub fn disable_count(&self) -> usize {
        self.disables.load(Ordering::SeqCst)
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }
}

impl FaceMatcher for MockFaceMatcher {
    fn enable_session(&mut self, _album: &IdentityAlbum) -> Result<()> {
        let mut enabled = self
            .enabled
            .lock()
            .map_err(|_| protocol_violation("mock state poisoned"))?;
        if *enabled {
            return Err(protocol_violation("enable_session while already enabled"));
        }
        *enabled = true;
        self.enables.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn disable_session(&mut self) -> Result<()> {
        let mut enabled = self
            .enabled
            .lock()
            .map_err(|_| protocol_violation("mock state poisoned"))?;
        if !*enabled {
            return Err(protocol_violation("disable_session while not enabled"));
        }
        *enabled = false;
        self.disables.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn match_faces(&mut self, _image: &[u8]) -> Result<Vec<FaceCandidate>> {
        if !self.enabled.lock().map(|e| *e).unwrap_or(false) {
            return Err(protocol_violation("match_faces outside an enabled session"));
        }
        self.submissions.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.lock().ok().and_then(|mut q| q.pop_front());
        match reply {
            Some(Ok(candidates)) => Ok(candidates),
            Some(Err(message)) => Err(AnswerboxError::Service { message }),
            None => Ok(Vec::new()),
        }
    }
}
