//! Face identification: poll frames from a camera source and submit them to
//! the recognition service until a known face clears the confidence floor.

use crate::defaults;
use crate::error::{AnswerboxError, Result};
use crate::service::{FaceMatcher, IdentityAlbum};
use std::thread;
use std::time::{Duration, Instant};

/// One camera frame. Raw grayscale frames are PNG-encoded before upload;
/// pre-encoded frames (typically JPEG snapshots) pass through untouched.
#[derive(Debug, Clone)]
pub enum Frame {
    Gray8 {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    },
    Encoded(Vec<u8>),
}

impl Frame {
    /// Bytes ready for upload.
    pub fn to_upload_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Frame::Gray8 {
                width,
                height,
                pixels,
            } => encode_gray_png(*width, *height, pixels),
            Frame::Encoded(bytes) => Ok(bytes.clone()),
        }
    }

    /// Whether the frame is large enough for recognition to be worthwhile.
    /// Pre-encoded frames are assumed camera-sized.
    pub fn is_usable(&self) -> bool {
        match self {
            Frame::Gray8 { width, height, .. } => {
                *width >= defaults::MIN_FRAME_WIDTH && *height >= defaults::MIN_FRAME_HEIGHT
            }
            Frame::Encoded(bytes) => !bytes.is_empty(),
        }
    }
}

fn encode_gray_png(width: u32, height: u32, pixels: &[u8]) -> Result<Vec<u8>> {
    if pixels.len() != (width as usize) * (height as usize) {
        return Err(AnswerboxError::Other(format!(
            "frame claims {width}x{height} but carries {} pixels",
            pixels.len()
        )));
    }
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Grayscale);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| AnswerboxError::Other(format!("png header: {e}")))?;
        writer
            .write_image_data(pixels)
            .map_err(|e| AnswerboxError::Other(format!("png encode: {e}")))?;
    }
    Ok(out)
}

/// Source of camera frames.
pub trait FrameSource: Send {
    fn is_open(&self) -> bool;

    /// Grab the next frame. None means no frame is available right now.
    fn read_frame(&mut self) -> Result<Option<Frame>>;
}

/// Scripted frame source for tests.
#[derive(Default)]
pub struct MockFrameSource {
    frames: Vec<Frame>,
    next: usize,
    cycle: bool,
    read_count: usize,
    open_limit: Option<usize>,
}

impl MockFrameSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frames(mut self, frames: Vec<Frame>) -> Self {
        self.frames = frames;
        self
    }

    /// Keep replaying the scripted frames instead of running dry.
    pub fn cycling(mut self) -> Self {
        self.cycle = true;
        self
    }

    /// Report the source as closed after this many reads.
    pub fn closing_after(mut self, reads: usize) -> Self {
        self.open_limit = Some(reads);
        self
    }

    pub fn read_count(&self) -> usize {
        self.read_count
    }
}

impl FrameSource for MockFrameSource {
    fn is_open(&self) -> bool {
        !self.frames.is_empty()
            && self.open_limit.is_none_or(|limit| self.read_count < limit)
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        self.read_count += 1;
        if self.next >= self.frames.len() {
            if !self.cycle {
                return Ok(None);
            }
            self.next = 0;
        }
        let frame = self.frames[self.next].clone();
        self.next += 1;
        Ok(Some(frame))
    }
}

/// Camera reached over HTTP: every read fetches one snapshot from a fixed
/// URL. PGM (P5) replies are decoded to grayscale; anything else is assumed
/// to be an already-encoded image and passed through.
#[cfg(feature = "http-service")]
pub struct HttpSnapshotSource {
    client: reqwest::blocking::Client,
    url: String,
}

#[cfg(feature = "http-service")]
impl HttpSnapshotSource {
    pub fn new(url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(defaults::RPC_TIMEOUT)
            .build()
            .map_err(|e| AnswerboxError::Service {
                message: format!("failed to build snapshot client: {e}"),
            })?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[cfg(feature = "http-service")]
impl FrameSource for HttpSnapshotSource {
    fn is_open(&self) -> bool {
        true
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let response = match self.client.get(&self.url).send() {
            Ok(response) => response,
            Err(e) => {
                eprintln!("answerbox: snapshot fetch failed: {e}");
                return Ok(None);
            }
        };
        if !response.status().is_success() {
            return Ok(None);
        }
        let bytes = response
            .bytes()
            .map_err(|e| AnswerboxError::Service {
                message: format!("snapshot body: {e}"),
            })?
            .to_vec();
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(parse_pgm(&bytes).unwrap_or(Frame::Encoded(bytes))))
    }
}

/// Parse a binary PGM (P5) image into a grayscale frame. Returns None when
/// the bytes are not PGM.
pub fn parse_pgm(bytes: &[u8]) -> Option<Frame> {
    if !bytes.starts_with(b"P5") {
        return None;
    }
    let mut cursor = 2;
    let mut fields = [0u32; 3];
    for field in fields.iter_mut() {
        while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
            cursor += 1;
        }
        let start = cursor;
        while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
            cursor += 1;
        }
        *field = std::str::from_utf8(&bytes[start..cursor]).ok()?.parse().ok()?;
    }
    // Exactly one whitespace byte separates the header from the raster.
    cursor += 1;
    let [width, height, maxval] = fields;
    if maxval > 255 {
        return None;
    }
    let expected = (width as usize).checked_mul(height as usize)?;
    let pixels = bytes.get(cursor..cursor + expected)?.to_vec();
    Some(Frame::Gray8 {
        width,
        height,
        pixels,
    })
}

/// Polls a frame source and submits frames to the matcher until a known
/// face clears the confidence floor or the timeout expires.
pub struct FaceIdentifier {
    matcher: Box<dyn FaceMatcher>,
    album: IdentityAlbum,
    confidence: f32,
    submit_interval: Duration,
}

impl FaceIdentifier {
    pub fn new(matcher: Box<dyn FaceMatcher>, album: IdentityAlbum) -> Self {
        Self {
            matcher,
            album,
            confidence: defaults::FACE_CONFIDENCE,
            submit_interval: defaults::FACE_SUBMIT_INTERVAL,
        }
    }

    pub fn with_tuning(mut self, confidence: f32, submit_interval: Duration) -> Self {
        self.confidence = confidence;
        self.submit_interval = submit_interval;
        self
    }

    /// Identify whoever is in front of the camera. Returns the matched key,
    /// or None when `timeout` elapses without a confident match. The matcher
    /// session is closed on every exit path.
    pub fn identify(
        &mut self,
        frames: &mut dyn FrameSource,
        timeout: Duration,
    ) -> Result<Option<String>> {
        if !frames.is_open() {
            return Ok(None);
        }
        self.matcher.enable_session(&self.album)?;

        let outcome = self.poll(frames, timeout);
        let disabled = self.matcher.disable_session();

        let matched = outcome?;
        disabled?;
        Ok(matched)
    }

    fn poll(&mut self, frames: &mut dyn FrameSource, timeout: Duration) -> Result<Option<String>> {
        let start = Instant::now();
        let mut last_submit: Option<Instant> = None;

        // A source that closes mid-identify ends the poll, not the timeout.
        while frames.is_open() && start.elapsed() < timeout {
            let Some(frame) = frames.read_frame()? else {
                thread::sleep(self.submit_interval);
                continue;
            };
            if !frame.is_usable() {
                continue;
            }
            // Frames arrive faster than the service can absorb them.
            if let Some(at) = last_submit {
                let since = at.elapsed();
                if since < self.submit_interval {
                    thread::sleep(self.submit_interval - since);
                }
            }

            let image = frame.to_upload_bytes()?;
            last_submit = Some(Instant::now());
            match self.matcher.match_faces(&image) {
                Ok(candidates) => {
                    // Only the top-ranked identity counts, and the floor is strict.
                    if let Some(hit) = candidates.first().filter(|c| c.confidence > self.confidence)
                    {
                        return Ok(Some(hit.key.clone()));
                    }
                }
                Err(AnswerboxError::Service { message }) => {
                    eprintln!("answerbox: face match failed, still watching: {message}");
                }
                Err(other) => return Err(other),
            }
        }
        Ok(None)
    }
}
