//! Transient audio artifacts with deterministic cleanup.
//!
//! Every captured segment that touches disk (for resampling or mailbox
//! storage) is wrapped in an [`AudioArtifact`]. The artifact has exactly one
//! owner and its backing file is removed when the owner drops it, on every
//! exit path. Cleanup failure is logged and non-fatal.

use crate::error::{AnswerboxError, Result};
use std::path::{Path, PathBuf};

/// A uniquely-named temporary WAV file, deleted on drop.
#[derive(Debug)]
pub struct AudioArtifact {
    path: PathBuf,
}

impl AudioArtifact {
    /// Create an empty artifact file with a unique name in the system
    /// temp directory.
    pub fn create(prefix: &str) -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(".wav")
            .tempfile()
            .map_err(|e| AnswerboxError::Artifact {
                message: format!("Failed to create temporary file: {}", e),
            })?;
        // Take over deletion: our Drop logs failures, TempPath's does not.
        let path = file
            .into_temp_path()
            .keep()
            .map_err(|e| AnswerboxError::Artifact {
                message: format!("Failed to persist temporary file: {}", e),
            })?;
        Ok(Self { path })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for AudioArtifact {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            // Best-effort deletion; a missing file is already gone.
            if e.kind() != std::io::ErrorKind::NotFound {
                eprintln!(
                    "answerbox: failed to remove artifact {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_produces_existing_unique_files() {
        let a = AudioArtifact::create("answerbox-test-").unwrap();
        let b = AudioArtifact::create("answerbox-test-").unwrap();
        assert!(a.path().exists());
        assert!(b.path().exists());
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn drop_removes_backing_file() {
        let artifact = AudioArtifact::create("answerbox-test-").unwrap();
        let path = artifact.path().to_path_buf();
        assert!(path.exists());
        drop(artifact);
        assert!(!path.exists());
    }

    #[test]
    fn drop_tolerates_already_removed_file() {
        let artifact = AudioArtifact::create("answerbox-test-").unwrap();
        std::fs::remove_file(artifact.path()).unwrap();
        // Must not panic or log spuriously.
        drop(artifact);
    }

    #[test]
    fn artifact_has_wav_suffix() {
        let artifact = AudioArtifact::create("answerbox-test-").unwrap();
        assert_eq!(
            artifact.path().extension().and_then(|e| e.to_str()),
            Some("wav")
        );
    }
}
