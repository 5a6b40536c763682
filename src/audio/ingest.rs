//! Ingest buffer: the producer/consumer boundary between the hardware
//! capture callback and the conversation thread.
//!
//! The producer ([`AudioInput`]) pushes chunks into an unbounded channel and
//! never blocks. The consumer wakes at a fixed cadence, trims the backlog to
//! a bounded depth (discarding the oldest chunks) and flushes the remainder
//! into one timestamped segment per tick.

use crate::audio::input::AudioInput;
use crate::audio::segment::{AudioSegment, SegmentFormat};
use crate::defaults;
use crate::error::Result;
use crossbeam_channel::Receiver;
use std::thread;
use std::time::{Duration, Instant};

/// Tuning knobs for the drain loop.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Drain cadence.
    pub poll_interval: Duration,
    /// Maximum backlog kept per tick; older chunks are discarded.
    pub max_pending_chunks: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            poll_interval: defaults::POLL_INTERVAL,
            max_pending_chunks: defaults::MAX_PENDING_CHUNKS,
        }
    }
}

/// Consumer side of a capture channel.
pub struct IngestBuffer {
    chunks: Receiver<Vec<i16>>,
    format: SegmentFormat,
    config: IngestConfig,
}

impl IngestBuffer {
    pub fn new(chunks: Receiver<Vec<i16>>, format: SegmentFormat) -> Self {
        Self::with_config(chunks, format, IngestConfig::default())
    }

    pub fn with_config(
        chunks: Receiver<Vec<i16>>,
        format: SegmentFormat,
        config: IngestConfig,
    ) -> Self {
        Self {
            chunks,
            format,
            config,
        }
    }

    /// One drain tick: flush everything currently queued into a single
    /// segment. Returns None when the queue is empty.
    ///
    /// If more than `max_pending_chunks` chunks have piled up since the last
    /// tick, the oldest excess is discarded first. This bounds latency at
    /// the cost of occasional data loss under a slow consumer.
    pub fn drain(&self) -> Option<AudioSegment> {
        let mut pending: Vec<Vec<i16>> = self.chunks.try_iter().collect();
        if pending.is_empty() {
            return None;
        }

        if pending.len() > self.config.max_pending_chunks {
            let excess = pending.len() - self.config.max_pending_chunks;
            pending.drain(..excess);
        }

        let total = pending.iter().map(|c| c.len()).sum();
        let mut samples = Vec::with_capacity(total);
        for chunk in pending {
            samples.extend_from_slice(&chunk);
        }

        Some(AudioSegment::new(self.format, samples))
    }
}

/// Run a record-then-classify loop over a freshly started capture stream.
///
/// Drains a segment per tick and hands each non-empty segment to `classify`
/// in strict arrival order; the first `Some` short-circuits the loop. When
/// `timeout` elapses with no result, returns None. The input is stopped on
/// every exit path, including a classify error.
pub fn record<T, F>(
    input: &mut dyn AudioInput,
    config: &IngestConfig,
    timeout: Duration,
    classify: F,
) -> Result<Option<T>>
where
    F: FnMut(&AudioSegment) -> Result<Option<T>>,
{
    let (tx, rx) = crossbeam_channel::unbounded();
    input.start(tx)?;
    let buffer = IngestBuffer::with_config(rx, input.format(), config.clone());

    let outcome = drain_loop(&buffer, timeout, classify);
    let stopped = input.stop();

    let result = outcome?;
    stopped?;
    Ok(result)
}

fn drain_loop<T, F>(buffer: &IngestBuffer, timeout: Duration, mut classify: F) -> Result<Option<T>>
where
    F: FnMut(&AudioSegment) -> Result<Option<T>>,
{
    let start = Instant::now();
    while start.elapsed() < timeout {
        thread::sleep(buffer.config.poll_interval);

        let Some(segment) = buffer.drain() else {
            continue;
        };

        if let Some(result) = classify(&segment)? {
            return Ok(Some(result));
        }
    }
    Ok(None)
}
