//! Blocking HTTP client for the recognition/synthesis service.
//!
//! Endpoints follow the `{base}/services/{capability}/{action}` shape with
//! JSON bodies. Binary payloads (WAV, images) travel base64-encoded; the
//! synthesizer additionally zlib-compresses its WAV before encoding.

use crate::defaults;
use crate::error::{AnswerboxError, Result};
use crate::service::{
    FaceCandidate, FaceMatcher, IdentityAlbum, SpeechSynth, SpotCandidate, VocabularyEntry,
    WordSpotter,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use flate2::read::ZlibDecoder;
use serde::Deserialize;
use serde_json::json;
use std::io::Read;
use std::time::Duration;

/// Client for one capability session on the remote service.
pub struct HttpSpeechService {
    client: reqwest::blocking::Client,
    base_url: String,
    session_enabled: bool,
}

impl HttpSpeechService {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, defaults::RPC_TIMEOUT)
    }

    /// The timeout is a hard bound on every RPC, connection included. A
    /// stalled service must never wedge the conversation loop.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnswerboxError::Service {
                message: format!("failed to build http client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session_enabled: false,
        })
    }

    fn endpoint(&self, capability: &str, action: &str) -> String {
        format!("{}/services/{capability}/{action}", self.base_url)
    }

    fn post(&self, url: &str, body: serde_json::Value) -> Result<serde_json::Value> {
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .map_err(|e| AnswerboxError::Service {
                message: format!("POST {url}: {e}"),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(AnswerboxError::Service {
                message: format!("POST {url}: status {status}"),
            });
        }
        response.json().map_err(|e| AnswerboxError::Service {
            message: format!("POST {url}: invalid json reply: {e}"),
        })
    }

    fn require_enabled(&self, what: &str) -> Result<()> {
        if !self.session_enabled {
            return Err(AnswerboxError::SessionProtocol {
                message: format!("{what} outside an enabled session"),
            });
        }
        Ok(())
    }

    fn mark_enabled(&mut self, capability: &str) -> Result<()> {
        if self.session_enabled {
            return Err(AnswerboxError::SessionProtocol {
                message: format!("{capability} enable_session while already enabled"),
            });
        }
        self.session_enabled = true;
        Ok(())
    }

    fn mark_disabled(&mut self, capability: &str) -> Result<()> {
        if !self.session_enabled {
            return Err(AnswerboxError::SessionProtocol {
                message: format!("{capability} disable_session while not enabled"),
            });
        }
        self.session_enabled = false;
        Ok(())
    }
}

#[derive(Deserialize)]
struct SpotReply {
    #[serde(default)]
    nbests: Vec<SpotCandidate>,
}

#[derive(Deserialize)]
struct SynthReply {
    sound: String,
}

#[derive(Deserialize)]
struct FaceReply {
    #[serde(default)]
    nb_faces: u32,
    #[serde(default)]
    faces: Vec<FaceEntry>,
}

#[derive(Deserialize)]
struct FaceEntry {
    #[serde(default)]
    names: Vec<FaceCandidate>,
}

impl WordSpotter for HttpSpeechService {
    fn enable_session(&mut self, vocabulary: &[VocabularyEntry], lang: &str) -> Result<()> {
        self.mark_enabled("wordspotting")?;
        let url = self.endpoint("wordspotting", "enable_session");
        let outcome = self.post(
            &url,
            json!({
                "vocabulary": vocabulary,
                "language": lang,
            }),
        );
        if outcome.is_err() {
            self.session_enabled = false;
        }
        outcome.map(|_| ())
    }

    fn disable_session(&mut self) -> Result<()> {
        self.mark_disabled("wordspotting")?;
        let url = self.endpoint("wordspotting", "disable_session");
        self.post(&url, json!({})).map(|_| ())
    }

    fn spot(&mut self, wav: &[u8], sensitivity: f32) -> Result<Vec<SpotCandidate>> {
        self.require_enabled("spot")?;
        let url = self.endpoint("wordspotting", "process");
        let reply = self.post(
            &url,
            json!({
                "sound": BASE64.encode(wav),
                "sensitivity": sensitivity,
            }),
        )?;
        let parsed: SpotReply =
            serde_json::from_value(reply).map_err(|e| AnswerboxError::Service {
                message: format!("malformed wordspotting reply: {e}"),
            })?;
        Ok(parsed.nbests)
    }
}

impl SpeechSynth for HttpSpeechService {
    fn synthesize(&mut self, text: &str, lang: &str) -> Result<Vec<u8>> {
        let url = self.endpoint("tts", "process");
        let reply = self.post(
            &url,
            json!({
                "text": text,
                "language": lang,
            }),
        )?;
        let parsed: SynthReply =
            serde_json::from_value(reply).map_err(|e| AnswerboxError::Service {
                message: format!("malformed tts reply: {e}"),
            })?;
        decode_sound(&parsed.sound)
    }
}

impl FaceMatcher for HttpSpeechService {
    fn enable_session(&mut self, album: &IdentityAlbum) -> Result<()> {
        self.mark_enabled("face_recognition")?;
        let people: Vec<serde_json::Value> = album
            .entries()
            .map(|(name, images)| {
                let encoded: Vec<String> =
                    images.iter().map(|image| BASE64.encode(image)).collect();
                json!({ "key": name, "images": encoded })
            })
            .collect();
        let url = self.endpoint("face_recognition", "enable_session");
        let outcome = self.post(&url, json!({ "album": people }));
        if outcome.is_err() {
            self.session_enabled = false;
        }
        outcome.map(|_| ())
    }

    fn disable_session(&mut self) -> Result<()> {
        self.mark_disabled("face_recognition")?;
        let url = self.endpoint("face_recognition", "disable_session");
        self.post(&url, json!({})).map(|_| ())
    }

    fn match_faces(&mut self, image: &[u8]) -> Result<Vec<FaceCandidate>> {
        self.require_enabled("match_faces")?;
        let url = self.endpoint("face_recognition", "process");
        let reply = self.post(
            &url,
            json!({
                "image": BASE64.encode(image),
            }),
        )?;
        let parsed: FaceReply =
            serde_json::from_value(reply).map_err(|e| AnswerboxError::Service {
                message: format!("malformed face_recognition reply: {e}"),
            })?;
        if parsed.nb_faces == 0 {
            return Ok(Vec::new());
        }
        // Candidates for the best-detected face only.
        Ok(parsed
            .faces
            .into_iter()
            .next()
            .map(|face| face.names)
            .unwrap_or_default())
    }
}

/// Decode a synthesized sound payload: base64, then zlib, yielding WAV bytes.
fn decode_sound(encoded: &str) -> Result<Vec<u8>> {
    let compressed = BASE64
        .decode(encoded)
        .map_err(|e| AnswerboxError::Service {
            message: format!("tts sound is not valid base64: {e}"),
        })?;
    let mut decoder = ZlibDecoder::new(compressed.as_slice());
    let mut wav = Vec::new();
    decoder
        .read_to_end(&mut wav)
        .map_err(|e| AnswerboxError::Service {
            message: format!("tts sound failed zlib decode: {e}"),
        })?;
    Ok(wav)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use std::io::Write;

    #[test]
    fn decode_sound_reverses_zlib_then_base64() {
        let wav = b"RIFFfake-wav-payload";
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(wav).unwrap();
        let compressed = encoder.finish().unwrap();
        let encoded = BASE64.encode(&compressed);

        let decoded = decode_sound(&encoded).unwrap();
        assert_eq!(decoded, wav);
    }

    #[test]
    fn decode_sound_rejects_garbage() {
        assert!(decode_sound("not base64 !!!").is_err());
        assert!(decode_sound(&BASE64.encode(b"not zlib")).is_err());
    }

    #[test]
    fn spot_reply_parses_nbests() {
        let reply: SpotReply = serde_json::from_value(json!({
            "nbests": [
                { "words": "yes", "confidence": 0.42 },
                { "words": "no", "confidence": 0.03 },
            ]
        }))
        .unwrap();
        assert_eq!(reply.nbests.len(), 2);
        assert_eq!(reply.nbests[0].words, "yes");
    }

    #[test]
    fn face_reply_defaults_to_no_faces() {
        let reply: FaceReply = serde_json::from_value(json!({})).unwrap();
        assert_eq!(reply.nb_faces, 0);
        assert!(reply.faces.is_empty());
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let service = HttpSpeechService::new("http://localhost:8080/").unwrap();
        assert_eq!(
            service.endpoint("tts", "process"),
            "http://localhost:8080/services/tts/process"
        );
    }

    #[test]
    fn process_calls_require_a_session() {
        let mut service = HttpSpeechService::new("http://localhost:8080").unwrap();
        assert!(matches!(
            service.spot(&[], 0.9),
            Err(AnswerboxError::SessionProtocol { .. })
        ));
        assert!(matches!(
            service.match_faces(&[]),
            Err(AnswerboxError::SessionProtocol { .. })
        ));
    }
}
