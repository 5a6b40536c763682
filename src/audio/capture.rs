//! Real audio I/O using CPAL (Cross-Platform Audio Library).
//!
//! Capture runs at the device's native sample rate, mono, and delivers
//! fixed-size chunks to the ingest channel from the hardware callback.
//! Playback is synchronous: `play` blocks until the stream drains.

use crate::audio::input::AudioInput;
use crate::audio::playback::AudioOutput;
use crate::audio::segment::{AudioSegment, SegmentFormat};
use crate::defaults;
use crate::error::{AnswerboxError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Run a closure with stderr temporarily redirected to /dev/null.
///
/// This suppresses noisy ALSA/JACK/PipeWire messages that CPAL triggers
/// when probing audio backends. The messages are harmless but confusing to users.
///
/// # Safety
/// Uses `libc::dup`/`libc::dup2` to save and restore file descriptor 2 (stderr).
/// Safe as long as no other thread is concurrently manipulating fd 2.
fn with_suppressed_stderr<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    unsafe {
        let saved_fd = libc::dup(2);
        let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
        if saved_fd >= 0 && devnull >= 0 {
            libc::dup2(devnull, 2);
            libc::close(devnull);
        }

        let result = f();

        if saved_fd >= 0 {
            libc::dup2(saved_fd, 2);
            libc::close(saved_fd);
        }

        result
    }
}

/// Quiet down the audio backends before any device probing.
pub fn suppress_audio_warnings() {
    // SAFETY: Called at startup before any threads are spawned
    unsafe {
        // Suppress JACK "cannot connect" messages - don't try to start JACK server
        std::env::set_var("JACK_NO_START_SERVER", "1");
        // Disable JACK completely for CPAL probing
        std::env::set_var("JACK_NO_AUDIO_RESERVATION", "1");
        // Force PipeWire to not print debug messages
        std::env::set_var("PIPEWIRE_DEBUG", "0");
        // Suppress ALSA verbose messages
        std::env::set_var("ALSA_DEBUG", "0");
        // Tell PipeWire's JACK to be quiet
        std::env::set_var("PW_LOG", "0");
    }
}

/// Preferred device names for desktop PipeWire/Pulse environments.
const PREFERRED_DEVICES: &[&str] = &["pipewire", "pulse", "PulseAudio"];

/// Device name patterns to filter out (not useful for a voice kiosk).
const FILTERED_PATTERNS: &[&str] = &[
    "surround",
    "front:",
    "rear:",
    "center:",
    "side:",
    "Digital Output",
    "HDMI",
    "S/PDIF",
];

fn should_filter_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    FILTERED_PATTERNS
        .iter()
        .any(|pattern| lower.contains(&pattern.to_lowercase()))
}

fn is_preferred_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    PREFERRED_DEVICES
        .iter()
        .any(|pref| lower.contains(&pref.to_lowercase()))
}

/// List audio input device names, preferred ones marked "\[recommended\]".
///
/// # Errors
/// Returns `AnswerboxError::AudioCapture` if device enumeration fails.
pub fn list_input_devices() -> Result<Vec<String>> {
    list_devices(true)
}

/// List audio output device names, preferred ones marked "\[recommended\]".
pub fn list_output_devices() -> Result<Vec<String>> {
    list_devices(false)
}

fn list_devices(input: bool) -> Result<Vec<String>> {
    let devices = with_suppressed_stderr(|| {
        let host = cpal::default_host();
        if input {
            host.input_devices().map(|d| d.collect::<Vec<_>>())
        } else {
            host.output_devices().map(|d| d.collect::<Vec<_>>())
        }
    })
    .map_err(|e| AnswerboxError::AudioCapture {
        message: format!("Failed to enumerate devices: {}", e),
    })?;

    let mut device_names = Vec::new();
    for device in devices {
        if let Ok(name) = device.name() {
            if should_filter_device(&name) {
                continue;
            }
            if is_preferred_device(&name) {
                device_names.push(format!("{} [recommended]", name));
            } else {
                device_names.push(name);
            }
        }
    }

    Ok(device_names)
}

/// Find a device by name, or the best default (prefers PipeWire/Pulse).
fn find_device(device_name: Option<&str>, input: bool) -> Result<cpal::Device> {
    with_suppressed_stderr(|| {
        let host = cpal::default_host();

        let devices = if input {
            host.input_devices()
        } else {
            host.output_devices()
        }
        .map_err(|e| AnswerboxError::AudioCapture {
            message: format!("Failed to enumerate devices: {}", e),
        })?;

        if let Some(name) = device_name {
            for dev in devices {
                if let Ok(dev_name) = dev.name()
                    && dev_name == name
                {
                    return Ok(dev);
                }
            }
            return Err(AnswerboxError::AudioDeviceNotFound {
                device: name.to_string(),
            });
        }

        let mut fallback = None;
        for dev in devices {
            if let Ok(dev_name) = dev.name() {
                if is_preferred_device(&dev_name) {
                    return Ok(dev);
                }
                if fallback.is_none() && !should_filter_device(&dev_name) {
                    fallback = Some(dev);
                }
            }
        }

        let system_default = if input {
            host.default_input_device()
        } else {
            host.default_output_device()
        };

        fallback
            .or(system_default)
            .ok_or_else(|| AnswerboxError::AudioDeviceNotFound {
                device: "default".to_string(),
            })
    })
}

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: the stream is only touched behind the Mutex in the owning
/// source, from one thread at a time.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Microphone capture via CPAL.
///
/// Captures mono 16-bit PCM at the device's native sample rate and pushes
/// fixed-size chunks into the ingest channel from the audio callback.
/// Tries an i16 stream first, then f32 with software conversion.
pub struct CpalAudioInput {
    device: cpal::Device,
    stream: Arc<Mutex<Option<SendableStream>>>,
    native_rate: u32,
}

impl CpalAudioInput {
    /// Open the named input device, or the best default when `None`.
    ///
    /// # Errors
    /// `AudioDeviceNotFound` for an unknown name, `AudioCapture` when the
    /// device cannot report a default configuration.
    pub fn new(device_name: Option<&str>) -> Result<Self> {
        let device = find_device(device_name, true)?;
        let default_config =
            device
                .default_input_config()
                .map_err(|e| AnswerboxError::AudioCapture {
                    message: format!("Failed to query default input config: {}", e),
                })?;

        Ok(Self {
            device,
            stream: Arc::new(Mutex::new(None)),
            native_rate: default_config.sample_rate().0,
        })
    }

    fn build_stream(&self, tx: Sender<Vec<i16>>) -> Result<cpal::Stream> {
        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(self.native_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let err_callback = |err| {
            eprintln!("answerbox: audio stream error: {}", err);
        };

        // i16 path first — PipeWire/PulseAudio convert transparently.
        let chunk_tx = tx.clone();
        let mut acc: Vec<i16> = Vec::with_capacity(defaults::CHUNK_SAMPLES);
        if let Ok(stream) = self.device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                acc.extend_from_slice(data);
                while acc.len() >= defaults::CHUNK_SAMPLES {
                    let chunk: Vec<i16> = acc.drain(..defaults::CHUNK_SAMPLES).collect();
                    if chunk_tx.send(chunk).is_err() {
                        return;
                    }
                }
            },
            err_callback,
            None,
        ) {
            return Ok(stream);
        }

        // f32 fallback for devices that only expose float formats.
        let chunk_tx = tx;
        let mut acc: Vec<i16> = Vec::with_capacity(defaults::CHUNK_SAMPLES);
        self.device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    acc.extend(
                        data.iter()
                            .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16),
                    );
                    while acc.len() >= defaults::CHUNK_SAMPLES {
                        let chunk: Vec<i16> = acc.drain(..defaults::CHUNK_SAMPLES).collect();
                        if chunk_tx.send(chunk).is_err() {
                            return;
                        }
                    }
                },
                err_callback,
                None,
            )
            .map_err(|e| AnswerboxError::AudioCapture {
                message: format!("Failed to build input stream: {}", e),
            })
    }
}

impl AudioInput for CpalAudioInput {
    fn start(&mut self, chunks: Sender<Vec<i16>>) -> Result<()> {
        {
            let guard = self.stream.lock().map_err(|e| AnswerboxError::AudioCapture {
                message: format!("Failed to lock stream: {}", e),
            })?;
            if guard.is_some() {
                return Err(AnswerboxError::AudioCapture {
                    message: "capture already started".to_string(),
                });
            }
        }

        let stream = self.build_stream(chunks)?;
        stream.play().map_err(|e| AnswerboxError::AudioCapture {
            message: format!("Failed to start audio stream: {}", e),
        })?;

        let mut guard = self.stream.lock().map_err(|e| AnswerboxError::AudioCapture {
            message: format!("Failed to lock stream: {}", e),
        })?;
        *guard = Some(SendableStream(stream));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut guard = self.stream.lock().map_err(|e| AnswerboxError::AudioCapture {
            message: format!("Failed to lock stream: {}", e),
        })?;

        if let Some(stream) = guard.take() {
            stream.0.pause().map_err(|e| AnswerboxError::AudioCapture {
                message: format!("Failed to stop audio stream: {}", e),
            })?;
        }
        Ok(())
    }

    fn format(&self) -> SegmentFormat {
        SegmentFormat::mono(self.native_rate)
    }
}

/// Speaker playback via CPAL.
pub struct CpalAudioOutput {
    device: cpal::Device,
}

impl CpalAudioOutput {
    /// Open the named output device, or the best default when `None`.
    pub fn new(device_name: Option<&str>) -> Result<Self> {
        let device = find_device(device_name, false)?;
        Ok(Self { device })
    }

    fn build_output_stream(
        &self,
        config: &cpal::StreamConfig,
        samples: Arc<Vec<i16>>,
        position: Arc<AtomicUsize>,
        finished: Arc<AtomicBool>,
    ) -> Result<cpal::Stream> {
        let err_callback = |err| {
            eprintln!("answerbox: audio playback error: {}", err);
        };

        // i16 path first, f32 with conversion as the fallback.
        {
            let samples = Arc::clone(&samples);
            let position = Arc::clone(&position);
            let finished = Arc::clone(&finished);
            if let Ok(stream) = self.device.build_output_stream(
                config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    for out in data.iter_mut() {
                        let pos = position.fetch_add(1, Ordering::Relaxed);
                        if pos < samples.len() {
                            *out = samples[pos];
                        } else {
                            finished.store(true, Ordering::Relaxed);
                            *out = 0;
                        }
                    }
                },
                err_callback,
                None,
            ) {
                return Ok(stream);
            }
        }

        self.device
            .build_output_stream(
                config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for out in data.iter_mut() {
                        let pos = position.fetch_add(1, Ordering::Relaxed);
                        if pos < samples.len() {
                            *out = samples[pos] as f32 / i16::MAX as f32;
                        } else {
                            finished.store(true, Ordering::Relaxed);
                            *out = 0.0;
                        }
                    }
                },
                err_callback,
                None,
            )
            .map_err(|e| AnswerboxError::AudioPlayback {
                message: format!("Failed to build output stream: {}", e),
            })
    }
}

impl AudioOutput for CpalAudioOutput {
    fn play(&mut self, segment: &AudioSegment) -> Result<()> {
        if segment.is_empty() {
            return Ok(());
        }

        let format = segment.format();
        let config = cpal::StreamConfig {
            channels: format.channels.max(1),
            sample_rate: cpal::SampleRate(format.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let samples = Arc::new(segment.samples().to_vec());
        let position = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBool::new(false));

        let stream = self.build_output_stream(
            &config,
            Arc::clone(&samples),
            Arc::clone(&position),
            Arc::clone(&finished),
        )?;
        stream.play().map_err(|e| AnswerboxError::AudioPlayback {
            message: format!("Failed to start playback stream: {}", e),
        })?;

        // Block until the callback reports the source exhausted, bounded by
        // the segment's nominal duration plus slack in case the stream stalls.
        let deadline = Instant::now() + segment.duration() + Duration::from_millis(500);
        while !finished.load(Ordering::Relaxed) {
            if Instant::now() >= deadline {
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        // Let the hardware buffer flush before releasing the stream.
        std::thread::sleep(Duration::from_millis(100));
        drop(stream);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_filter_device_patterns() {
        assert!(should_filter_device("surround51"));
        assert!(should_filter_device("front:CARD=PCH"));
        assert!(should_filter_device("HDMI Output"));
        assert!(should_filter_device("Digital Output S/PDIF"));
        assert!(!should_filter_device("pipewire"));
        assert!(!should_filter_device("Built-in Audio"));
    }

    #[test]
    fn preferred_device_patterns() {
        assert!(is_preferred_device("pipewire"));
        assert!(is_preferred_device("PipeWire"));
        assert!(is_preferred_device("PulseAudio"));
        assert!(!is_preferred_device("hw:0,0"));
        assert!(!is_preferred_device("default"));
    }

    #[test]
    fn unknown_input_device_is_an_error() {
        let result = CpalAudioInput::new(Some("NonExistentDevice12345"));
        match result {
            Err(AnswerboxError::AudioDeviceNotFound { device }) => {
                assert_eq!(device, "NonExistentDevice12345");
            }
            Err(AnswerboxError::AudioCapture { .. }) => {
                // No audio backend available at all (CI) — also acceptable.
            }
            other => panic!("Expected device error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    #[ignore] // Requires audio hardware
    fn list_devices_returns_at_least_one_device() {
        let devices = list_input_devices().unwrap();
        assert!(!devices.is_empty());
    }

    #[test]
    #[ignore] // Requires audio hardware
    fn capture_start_stop_cycle() {
        let mut input = CpalAudioInput::new(None).expect("open default input");
        let (tx, rx) = crossbeam_channel::unbounded();
        input.start(tx).expect("start capture");
        std::thread::sleep(Duration::from_millis(600));
        input.stop().expect("stop capture");
        // At the native rate a chunk should have arrived within 600ms.
        assert!(rx.try_iter().next().is_some());
    }

    #[test]
    #[ignore] // Requires audio hardware
    fn playback_of_short_tone_completes() {
        let mut output = CpalAudioOutput::new(None).expect("open default output");
        let samples: Vec<i16> = (0..8000)
            .map(|i| ((i as f32 * 0.1).sin() * 8000.0) as i16)
            .collect();
        let segment = AudioSegment::new(SegmentFormat::mono(16000), samples);
        output.play(&segment).expect("play tone");
    }
}
