//! Command-line interface for answerbox
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Interactive voice and face answering machine
#[derive(Parser, Debug)]
#[command(
    name = "answerbox",
    version,
    about = "Interactive voice and face answering machine"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Audio input device (e.g., hw:0)
    #[arg(long, value_name = "DEVICE")]
    pub input_device: Option<String>,

    /// Audio output device
    #[arg(long, value_name = "DEVICE")]
    pub output_device: Option<String>,

    /// Base URL of the recognition/synthesis service
    #[arg(long, value_name = "URL")]
    pub service_url: Option<String>,

    /// Language code for recognition and synthesis (e.g., en-US)
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Directory with one subdirectory of reference images per person
    #[arg(long, value_name = "DIR")]
    pub ids_dir: Option<PathBuf>,

    /// Camera snapshot URL
    #[arg(long, value_name = "URL")]
    pub camera_url: Option<String>,

    /// Identification wait before giving up on a visitor. Examples: 30s, 1m
    #[arg(long, value_name = "DURATION", value_parser = parse_secs)]
    pub identify_timeout: Option<u64>,

    /// Maximum message recording length. Examples: 90s, 2m
    #[arg(long, value_name = "DURATION", value_parser = parse_secs)]
    pub message_timeout: Option<u64>,
}

/// Parse a duration string into seconds.
///
/// Supports any duration format accepted by `humantime`: bare numbers
/// (seconds), single-unit (`30s`, `5m`) and compound (`1m30s`).
fn parse_secs(s: &str) -> Result<u64, String> {
    let s = s.trim();
    // Bare number → seconds
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(secs);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_secs())
        .map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available audio devices
    Devices,

    /// Validate the configuration and known-identity directory, then exit
    Check,
}

impl Cli {
    /// Fold CLI overrides into a loaded configuration.
    pub fn apply_to(&self, mut config: crate::config::Config) -> crate::config::Config {
        if let Some(device) = &self.input_device {
            config.audio.input_device = Some(device.clone());
        }
        if let Some(device) = &self.output_device {
            config.audio.output_device = Some(device.clone());
        }
        if let Some(url) = &self.service_url {
            config.service.base_url = url.clone();
        }
        if let Some(language) = &self.language {
            config.service.language = language.clone();
        }
        if let Some(dir) = &self.ids_dir {
            config.identity.ids_dir = dir.clone();
        }
        if let Some(url) = &self.camera_url {
            config.identity.camera_url = Some(url.clone());
        }
        if let Some(secs) = self.identify_timeout {
            config.dialog.identify_timeout_secs = secs;
        }
        if let Some(secs) = self.message_timeout {
            config.dialog.message_timeout_secs = secs;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn parse_secs_accepts_bare_numbers_and_units() {
        assert_eq!(parse_secs("45"), Ok(45));
        assert_eq!(parse_secs("2m"), Ok(120));
        assert_eq!(parse_secs("1m30s"), Ok(90));
        assert!(parse_secs("soon").is_err());
    }

    #[test]
    fn no_args_parses_with_no_command() {
        let cli = Cli::parse_from(["answerbox"]);
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn devices_subcommand_parses() {
        let cli = Cli::parse_from(["answerbox", "devices"]);
        assert!(matches!(cli.command, Some(Commands::Devices)));
    }

    #[test]
    fn overrides_fold_into_config() {
        let cli = Cli::parse_from([
            "answerbox",
            "--service-url",
            "http://kiosk:9000",
            "--language",
            "fr-FR",
            "--ids-dir",
            "/srv/ids",
            "--identify-timeout",
            "1m",
        ]);
        let config = cli.apply_to(Config::default());
        assert_eq!(config.service.base_url, "http://kiosk:9000");
        assert_eq!(config.service.language, "fr-FR");
        assert_eq!(config.identity.ids_dir.to_str(), Some("/srv/ids"));
        assert_eq!(config.dialog.identify_timeout_secs, 60);
    }

    #[test]
    fn unset_overrides_leave_config_untouched() {
        let cli = Cli::parse_from(["answerbox"]);
        let config = cli.apply_to(Config::default());
        assert_eq!(config, Config::default());
    }
}
