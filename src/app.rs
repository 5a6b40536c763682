//! Kiosk entry point.
//!
//! Wires the configured audio devices, camera and remote service into a
//! [`ConversationController`] and runs visits forever.

use crate::audio::capture::{CpalAudioInput, CpalAudioOutput, suppress_audio_warnings};
use crate::config::Config;
use crate::controller::ConversationController;
use crate::dialog::Speaker;
use crate::error::{AnswerboxError, Result};
use crate::face::{FaceIdentifier, FrameSource, HttpSnapshotSource};
use crate::resample::SoxResampler;
use crate::service::http::HttpSpeechService;
use crate::service::{IdentityAlbum, vocabulary};
use crate::session::WordSession;
use std::path::Path;

/// Recognized image extensions for reference photos.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Load the known-identity album from a directory laid out as one
/// subdirectory of reference images per person.
pub fn load_identity_album(ids_dir: &Path) -> Result<IdentityAlbum> {
    let mut album = IdentityAlbum::new();
    if !ids_dir.is_dir() {
        return Err(AnswerboxError::Other(format!(
            "identity directory {} does not exist",
            ids_dir.display()
        )));
    }

    for entry in std::fs::read_dir(ids_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        for image_entry in std::fs::read_dir(entry.path())? {
            let image_path = image_entry?.path();
            let recognized = image_path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
            if !recognized {
                continue;
            }
            album.add_image(&name, std::fs::read(&image_path)?);
        }
    }
    Ok(album)
}

/// Run the kiosk with the given configuration. Never returns on success.
pub fn run_kiosk(config: Config, quiet: bool) -> Result<()> {
    // Suppress noisy JACK/ALSA warnings before audio init
    suppress_audio_warnings();

    let album = load_identity_album(&config.identity.ids_dir)?;
    if album.is_empty() {
        return Err(AnswerboxError::Other(format!(
            "no reference images found under {}",
            config.identity.ids_dir.display()
        )));
    }
    let names: Vec<&str> = album.names().collect();
    if !quiet {
        eprintln!("answerbox: {} known identities: {}", names.len(), names.join(", "));
    }

    let lang = &config.service.language;
    let timeout = config.service.request_timeout();
    let base_url = &config.service.base_url;

    let input = CpalAudioInput::new(config.audio.input_device.as_deref())?;
    let output = CpalAudioOutput::new(config.audio.output_device.as_deref())?;

    let speaker = Speaker::new(
        Box::new(HttpSpeechService::with_timeout(base_url, timeout)?),
        Box::new(output),
        lang,
    );

    let tune = |session: WordSession| {
        session.with_tuning(config.service.sensitivity, config.service.word_confidence)
    };
    let confirm = tune(WordSession::new(
        Box::new(HttpSpeechService::with_timeout(base_url, timeout)?),
        vocabulary(&["yes", "no"]),
        lang,
    ))
    .with_resampler(Box::new(SoxResampler));
    let name_session = tune(WordSession::new(
        Box::new(HttpSpeechService::with_timeout(base_url, timeout)?),
        album
            .names()
            .map(|name| crate::service::VocabularyEntry {
                words: name.to_string(),
            })
            .collect(),
        lang,
    ))
    .with_resampler(Box::new(SoxResampler));
    let recorder = tune(WordSession::new(
        Box::new(HttpSpeechService::with_timeout(base_url, timeout)?),
        vocabulary(&[crate::defaults::STOP_WORD]),
        lang,
    ))
    .with_resampler(Box::new(SoxResampler));

    let identifier = FaceIdentifier::new(
        Box::new(HttpSpeechService::with_timeout(base_url, timeout)?),
        album,
    )
    .with_tuning(
        config.service.face_confidence,
        crate::defaults::FACE_SUBMIT_INTERVAL,
    );

    let frames: Box<dyn FrameSource> = match &config.identity.camera_url {
        Some(url) => Box::new(HttpSnapshotSource::new(url)?),
        None => {
            return Err(AnswerboxError::Other(
                "no camera_url configured".to_string(),
            ));
        }
    };

    let mut controller = ConversationController::new(
        speaker,
        confirm,
        name_session,
        recorder,
        identifier,
        Box::new(input),
        frames,
    )
    .with_timeouts(config.dialog.timeouts());

    if !quiet {
        eprintln!("answerbox: ready, watching for visitors");
    }
    controller.run();
    Ok(())
}

/// Validate the configuration without touching any hardware.
pub fn run_check(config: &Config) -> Result<()> {
    let album = load_identity_album(&config.identity.ids_dir)?;
    println!(
        "identities: {} ({} images)",
        album.len(),
        album.entries().map(|(_, images)| images.len()).sum::<usize>()
    );
    println!("service: {}", config.service.base_url);
    match &config.identity.camera_url {
        Some(url) => println!("camera: {url}"),
        None => println!("camera: not configured"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn album_scan_groups_images_by_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("Sylvain")).unwrap();
        fs::write(dir.path().join("Sylvain/front.jpg"), b"jpegdata").unwrap();
        fs::write(dir.path().join("Sylvain/side.PNG"), b"pngdata").unwrap();
        fs::write(dir.path().join("Sylvain/notes.txt"), b"skip me").unwrap();
        fs::create_dir(dir.path().join("Gwennael")).unwrap();
        fs::write(dir.path().join("Gwennael/face.jpeg"), b"jpegdata").unwrap();
        // Stray file at the top level is ignored.
        fs::write(dir.path().join("README"), b"ignored").unwrap();

        let album = load_identity_album(dir.path()).unwrap();
        assert_eq!(album.len(), 2);
        let sylvain = album
            .entries()
            .find(|(name, _)| *name == "Sylvain")
            .map(|(_, images)| images.len());
        assert_eq!(sylvain, Some(2));
    }

    #[test]
    fn missing_ids_dir_is_an_error() {
        assert!(load_identity_album(Path::new("/nonexistent/ids")).is_err());
    }
}
