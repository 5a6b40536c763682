//! Resampling of audio artifacts to the service rate.
//!
//! The recognition service only accepts 16kHz mono, so each captured
//! segment is resampled before submission. The default implementation
//! resamples in-process; `SoxResampler` shells out to `sox` for parity with
//! deployments that already depend on it.

use crate::audio::segment::AudioSegment;
use crate::error::{AnswerboxError, Result};
use std::path::Path;
use std::process::Command;

/// Converts a WAV file to mono at the target rate.
pub trait Resampler: Send {
    fn resample_file(&self, input: &Path, output: &Path, target_rate: u32) -> Result<()>;
}

/// In-process linear-interpolation resampler.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearResampler;

impl Resampler for LinearResampler {
    fn resample_file(&self, input: &Path, output: &Path, target_rate: u32) -> Result<()> {
        let segment = AudioSegment::read_wav(input)?;
        segment.resampled_to(target_rate).write_wav(output)
    }
}

/// External `sox` invocation. Unlike the tool's usual fire-and-forget use,
/// the exit status is checked and surfaced.
#[derive(Debug, Default, Clone, Copy)]
pub struct SoxResampler;

impl Resampler for SoxResampler {
    fn resample_file(&self, input: &Path, output: &Path, target_rate: u32) -> Result<()> {
        let status = Command::new("sox")
            .arg(input)
            .arg("-r")
            .arg(target_rate.to_string())
            .arg("-c")
            .arg("1")
            .arg(output)
            .status()
            .map_err(|e| AnswerboxError::Resample {
                message: format!("failed to launch sox: {}", e),
            })?;

        if !status.success() {
            return Err(AnswerboxError::Resample {
                message: format!("sox exited with {}", status),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::segment::SegmentFormat;

    #[test]
    fn linear_resampler_converts_file_to_target_rate() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");

        let segment = AudioSegment::new(SegmentFormat::mono(48000), vec![250i16; 4800]);
        segment.write_wav(&input).unwrap();

        LinearResampler.resample_file(&input, &output, 16000).unwrap();

        let resampled = AudioSegment::read_wav(&output).unwrap();
        assert_eq!(resampled.format().sample_rate, 16000);
        assert_eq!(resampled.format().channels, 1);
        assert_eq!(resampled.len(), 1600);
    }

    #[test]
    fn linear_resampler_downmixes_stereo_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");

        let stereo = AudioSegment::new(
            SegmentFormat {
                channels: 2,
                sample_rate: 16000,
            },
            vec![100i16, 300, 100, 300],
        );
        stereo.write_wav(&input).unwrap();

        LinearResampler.resample_file(&input, &output, 16000).unwrap();

        let resampled = AudioSegment::read_wav(&output).unwrap();
        assert_eq!(resampled.format().channels, 1);
        assert_eq!(resampled.samples(), &[200i16, 200]);
    }

    #[test]
    fn linear_resampler_errors_on_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let result = LinearResampler.resample_file(
            &dir.path().join("missing.wav"),
            &dir.path().join("out.wav"),
            16000,
        );
        assert!(result.is_err());
    }
}
