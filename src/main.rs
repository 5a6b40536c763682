use answerbox::app::{run_check, run_kiosk};
use answerbox::audio::capture::{list_input_devices, list_output_devices};
use answerbox::cli::{Cli, Commands};
use answerbox::config::Config;
use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = cli.apply_to(Config::load_or_default(&path)?.with_env_overrides());

    match cli.command {
        None => run_kiosk(config, cli.quiet)?,
        Some(Commands::Devices) => {
            println!("Input devices:");
            for device in list_input_devices()? {
                println!("  {device}");
            }
            println!("Output devices:");
            for device in list_output_devices()? {
                println!("  {device}");
            }
        }
        Some(Commands::Check) => run_check(&config)?,
    }
    Ok(())
}
