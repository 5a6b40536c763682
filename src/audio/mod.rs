//! Audio capture, buffering, and playback.

#[cfg(feature = "cpal-audio")]
pub mod capture;
pub mod ingest;
pub mod input;
pub mod playback;
pub mod segment;
