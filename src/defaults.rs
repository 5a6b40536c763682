//! Default configuration constants for answerbox.
//!
//! This module provides shared constants used across different configuration
//! types to ensure consistency and eliminate duplication.

use std::time::Duration;

/// Sample rate required by the remote recognition service, in Hz.
///
/// Word spotting only accepts 16kHz mono; captured segments are resampled
/// to this rate before submission.
pub const SERVICE_SAMPLE_RATE: u32 = 16000;

/// Drain cadence of the ingest buffer consumer loop.
///
/// The record loop wakes at this interval, trims the pending-chunk queue
/// and flushes whatever is queued into one segment.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Maximum number of capture chunks allowed to pile up between drains.
///
/// Excess chunks beyond this bound are discarded oldest-first, trading
/// occasional data loss for bounded latency under a slow consumer.
pub const MAX_PENDING_CHUNKS: usize = 3;

/// Samples per chunk pushed by the hardware capture callback.
pub const CHUNK_SAMPLES: usize = 8192;

/// Sensitivity passed to the word-spotting service with every request.
pub const REQUEST_SENSITIVITY: f32 = 0.9;

/// Minimum confidence for a spotted word to count as an answer.
pub const WORD_CONFIDENCE: f32 = 0.15;

/// Minimum confidence for a face match to count as an identification.
pub const FACE_CONFIDENCE: f32 = 0.10;

/// Hard per-call timeout applied to every remote service request.
///
/// The reference design never bounds the blocking RPC itself; without this
/// a stalled service would hang an ask past its budget.
pub const RPC_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimum pause between face-recognition submissions.
///
/// Caps the request rate at the service instead of submitting one request
/// per camera frame.
pub const FACE_SUBMIT_INTERVAL: Duration = Duration::from_millis(200);

/// Minimum capture resolution accepted for face recognition.
pub const MIN_FRAME_WIDTH: u32 = 640;
pub const MIN_FRAME_HEIGHT: u32 = 480;

/// How long the kiosk watches the camera for a known face each cycle.
pub const IDENTIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout and attempt count for yes/no questions.
pub const CONFIRM_TIMEOUT: Duration = Duration::from_secs(5);
pub const CONFIRM_ATTEMPTS: u32 = 3;

/// Timeout and attempt count for the "who is the recipient?" question.
pub const RECIPIENT_TIMEOUT: Duration = Duration::from_secs(10);
pub const RECIPIENT_ATTEMPTS: u32 = 4;

/// Maximum length of a recorded message before the stop keyword.
pub const MESSAGE_TIMEOUT: Duration = Duration::from_secs(90);

/// Default language tag sent to the recognition and synthesis services.
pub const LANGUAGE: &str = "en-US";

/// Keyword ending a message recording.
pub const STOP_WORD: &str = "stop";
