//! Audio input sources.
//!
//! An [`AudioInput`] is the producer side of the ingest buffer: once started
//! it pushes fixed-size sample chunks into a channel from its own capture
//! context and never blocks on the consumer.

use crate::audio::segment::SegmentFormat;
use crate::error::{AnswerboxError, Result};
use crossbeam_channel::Sender;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// Trait for audio capture devices.
///
/// This trait allows swapping implementations (real audio device vs mock).
pub trait AudioInput: Send {
    /// Start capturing. Chunks of 16-bit PCM samples are delivered through
    /// `chunks` until `stop` is called; the producer must not block on a
    /// slow consumer.
    fn start(&mut self, chunks: Sender<Vec<i16>>) -> Result<()>;

    /// Stop capturing and release the stream.
    fn stop(&mut self) -> Result<()>;

    /// Format of the delivered samples.
    fn format(&self) -> SegmentFormat;
}

/// Mock audio input for testing.
///
/// Feeds scripted chunks from a background thread, optionally cycling
/// through them until stopped.
pub struct MockAudioInput {
    format: SegmentFormat,
    chunks: Vec<Vec<i16>>,
    chunk_interval: Duration,
    cycle: bool,
    should_fail_start: bool,
    running: Arc<AtomicBool>,
    start_count: Arc<AtomicUsize>,
    stop_count: Arc<AtomicUsize>,
}

impl MockAudioInput {
    pub fn new() -> Self {
        Self {
            format: SegmentFormat::mono(16000),
            chunks: Vec::new(),
            chunk_interval: Duration::ZERO,
            cycle: false,
            should_fail_start: false,
            running: Arc::new(AtomicBool::new(false)),
            start_count: Arc::new(AtomicUsize::new(0)),
            stop_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Configure the scripted chunks delivered after start.
    pub fn with_chunks(mut self, chunks: Vec<Vec<i16>>) -> Self {
        self.chunks = chunks;
        self
    }

    /// Configure a delay between delivered chunks.
    pub fn with_chunk_interval(mut self, interval: Duration) -> Self {
        self.chunk_interval = interval;
        self
    }

    /// Keep cycling through the scripted chunks until stopped.
    pub fn cycling(mut self) -> Self {
        self.cycle = true;
        self
    }

    /// Configure the sample format reported by the mock.
    pub fn with_format(mut self, format: SegmentFormat) -> Self {
        self.format = format;
        self
    }

    /// Configure the mock to fail on start.
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    pub fn start_count(&self) -> usize {
        self.start_count.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stop_count.load(Ordering::SeqCst)
    }
}

impl Default for MockAudioInput {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioInput for MockAudioInput {
    fn start(&mut self, chunks: Sender<Vec<i16>>) -> Result<()> {
        if self.should_fail_start {
            return Err(AnswerboxError::AudioCapture {
                message: "mock audio error".to_string(),
            });
        }
        self.start_count.fetch_add(1, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);

        let scripted = self.chunks.clone();
        let interval = self.chunk_interval;
        let cycle = self.cycle;
        let running = Arc::clone(&self.running);

        thread::spawn(move || {
            loop {
                for chunk in &scripted {
                    if !running.load(Ordering::SeqCst) {
                        return;
                    }
                    if chunks.send(chunk.clone()).is_err() {
                        return;
                    }
                    if !interval.is_zero() {
                        thread::sleep(interval);
                    }
                }
                if !cycle {
                    return;
                }
            }
        });

        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        self.stop_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn format(&self) -> SegmentFormat {
        self.format
    }
}
