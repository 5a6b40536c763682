//! Audio segments: bounded slices of captured PCM with their format.

use crate::error::{AnswerboxError, Result};
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

/// PCM format parameters of a segment. Samples are always 16-bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentFormat {
    pub channels: u16,
    pub sample_rate: u32,
}

impl SegmentFormat {
    pub fn mono(sample_rate: u32) -> Self {
        Self {
            channels: 1,
            sample_rate,
        }
    }

    fn wav_spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        }
    }
}

/// An immutable slice of captured audio, flushed from the ingest buffer at
/// one point in time.
#[derive(Debug, Clone)]
pub struct AudioSegment {
    format: SegmentFormat,
    samples: Vec<i16>,
}

impl AudioSegment {
    pub fn new(format: SegmentFormat, samples: Vec<i16>) -> Self {
        Self { format, samples }
    }

    pub fn format(&self) -> SegmentFormat {
        self.format
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Wall-clock duration of the segment.
    pub fn duration(&self) -> Duration {
        let frames = self.samples.len() as u64 / self.format.channels.max(1) as u64;
        Duration::from_micros(frames * 1_000_000 / self.format.sample_rate as u64)
    }

    /// Encode the segment as a WAV file in memory.
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, self.format.wav_spec())
                .map_err(wav_error)?;
            for &sample in &self.samples {
                writer.write_sample(sample).map_err(wav_error)?;
            }
            writer.finalize().map_err(wav_error)?;
        }
        Ok(cursor.into_inner())
    }

    /// Write the segment to a WAV file on disk.
    pub fn write_wav(&self, path: &Path) -> Result<()> {
        let mut writer =
            hound::WavWriter::create(path, self.format.wav_spec()).map_err(wav_error)?;
        for &sample in &self.samples {
            writer.write_sample(sample).map_err(wav_error)?;
        }
        writer.finalize().map_err(wav_error)?;
        Ok(())
    }

    /// Read a 16-bit WAV file into a segment, preserving its format.
    pub fn read_wav(path: &Path) -> Result<Self> {
        let mut reader = hound::WavReader::open(path).map_err(wav_error)?;
        Self::from_wav_reader(&mut reader)
    }

    /// Decode a 16-bit WAV byte buffer into a segment.
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).map_err(wav_error)?;
        Self::from_wav_reader(&mut reader)
    }

    fn from_wav_reader<R: std::io::Read>(reader: &mut hound::WavReader<R>) -> Result<Self> {
        let spec = reader.spec();
        if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
            return Err(AnswerboxError::WavFormat {
                message: format!(
                    "expected 16-bit integer PCM, got {}-bit {:?}",
                    spec.bits_per_sample, spec.sample_format
                ),
            });
        }
        let samples: std::result::Result<Vec<i16>, _> = reader.samples::<i16>().collect();
        Ok(Self {
            format: SegmentFormat {
                channels: spec.channels,
                sample_rate: spec.sample_rate,
            },
            samples: samples.map_err(wav_error)?,
        })
    }

    /// Mix down to mono by averaging channels.
    pub fn to_mono(&self) -> Self {
        if self.format.channels <= 1 {
            return self.clone();
        }
        let channels = self.format.channels as usize;
        let mono: Vec<i16> = self
            .samples
            .chunks_exact(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect();
        Self {
            format: SegmentFormat::mono(self.format.sample_rate),
            samples: mono,
        }
    }

    /// Resample to the target rate, mixing to mono first if needed.
    pub fn resampled_to(&self, target_rate: u32) -> Self {
        let mono = self.to_mono();
        if mono.format.sample_rate == target_rate {
            return mono;
        }
        Self {
            format: SegmentFormat::mono(target_rate),
            samples: resample(&mono.samples, mono.format.sample_rate, target_rate),
        }
    }

    /// Concatenate segments in order. The merged segment inherits the first
    /// segment's format parameters. Returns None for an empty input.
    pub fn concat(segments: &[AudioSegment]) -> Option<Self> {
        let first = segments.first()?;
        let mut samples = Vec::with_capacity(segments.iter().map(|s| s.len()).sum());
        for segment in segments {
            samples.extend_from_slice(&segment.samples);
        }
        Some(Self {
            format: first.format,
            samples,
        })
    }
}

fn wav_error<E: std::fmt::Display>(e: E) -> AnswerboxError {
    AnswerboxError::WavFormat {
        message: e.to_string(),
    }
}

/// Simple linear interpolation resampling.
pub fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[source_idx]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono_segment(rate: u32, samples: Vec<i16>) -> AudioSegment {
        AudioSegment::new(SegmentFormat::mono(rate), samples)
    }

    #[test]
    fn wav_round_trip_preserves_samples_and_format() {
        let segment = mono_segment(44100, vec![100i16, -200, 300, -400]);
        let bytes = segment.to_wav_bytes().unwrap();
        let decoded = AudioSegment::from_wav_bytes(&bytes).unwrap();

        assert_eq!(decoded.format(), segment.format());
        assert_eq!(decoded.samples(), segment.samples());
    }

    #[test]
    fn write_and_read_wav_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("segment.wav");
        let segment = mono_segment(16000, vec![1i16, 2, 3, 4, 5]);

        segment.write_wav(&path).unwrap();
        let decoded = AudioSegment::read_wav(&path).unwrap();

        assert_eq!(decoded.samples(), segment.samples());
        assert_eq!(decoded.format().sample_rate, 16000);
    }

    #[test]
    fn from_wav_bytes_rejects_garbage() {
        let result = AudioSegment::from_wav_bytes(&[0u8, 1, 2, 3, 4, 5]);
        assert!(result.is_err());
    }

    #[test]
    fn concat_is_order_preserving_with_first_format() {
        let s1 = mono_segment(48000, vec![1i16, 2]);
        let s2 = mono_segment(16000, vec![3i16, 4]);
        let s3 = mono_segment(8000, vec![5i16]);

        let merged = AudioSegment::concat(&[s1, s2, s3]).unwrap();

        assert_eq!(merged.samples(), &[1i16, 2, 3, 4, 5]);
        assert_eq!(merged.format().sample_rate, 48000);
    }

    #[test]
    fn concat_of_nothing_is_none() {
        assert!(AudioSegment::concat(&[]).is_none());
    }

    #[test]
    fn to_mono_averages_stereo_pairs() {
        let stereo = AudioSegment::new(
            SegmentFormat {
                channels: 2,
                sample_rate: 16000,
            },
            vec![100i16, 200, 300, 400],
        );
        let mono = stereo.to_mono();
        assert_eq!(mono.samples(), &[150i16, 350]);
        assert_eq!(mono.format().channels, 1);
    }

    #[test]
    fn resampled_to_halves_sample_count() {
        let segment = mono_segment(32000, vec![500i16; 3200]);
        let resampled = segment.resampled_to(16000);
        assert_eq!(resampled.format().sample_rate, 16000);
        assert_eq!(resampled.len(), 1600);
        assert!(resampled.samples().iter().all(|&s| (499..=501).contains(&s)));
    }

    #[test]
    fn resample_identity_same_rate() {
        let samples = vec![100i16, 200, 300];
        assert_eq!(resample(&samples, 16000, 16000), samples);
    }

    #[test]
    fn resample_upsample_interpolates() {
        let resampled = resample(&[0i16, 1000, 2000], 8000, 16000);
        assert_eq!(resampled.len(), 6);
        assert_eq!(resampled[0], 0);
        assert!(resampled[1] > 0 && resampled[1] < 1000);
        assert_eq!(resampled[2], 1000);
    }

    #[test]
    fn resample_handles_empty_and_single() {
        assert!(resample(&[], 16000, 8000).is_empty());
        let single = resample(&[100i16], 16000, 8000);
        assert_eq!(single, vec![100i16]);
    }

    #[test]
    fn duration_accounts_for_channels() {
        let segment = mono_segment(16000, vec![0i16; 16000]);
        assert_eq!(segment.duration(), Duration::from_secs(1));

        let stereo = AudioSegment::new(
            SegmentFormat {
                channels: 2,
                sample_rate: 16000,
            },
            vec![0i16; 32000],
        );
        assert_eq!(stereo.duration(), Duration::from_secs(1));
    }
}
