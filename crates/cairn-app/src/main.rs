//! The `cairn` command-line tool: inspect chunk files and tick a world.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use cairn_config::{CliArgs, Config, default_config_dir};
use cairn_voxel::BrightnessScale;
use clap::{Parser, Subcommand};

use crate::commands::AppError;

#[derive(Parser, Debug)]
#[command(name = "cairn", version, about = "Voxel chunk storage tools")]
struct Cli {
    #[command(flatten)]
    args: CliArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a chunk file and print its block table.
    Inspect {
        /// Chunk file to read.
        file: PathBuf,
    },
    /// Advance the configured world by one tick.
    Tick,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_dir = match cli.args.config.clone() {
        Some(dir) => dir,
        None => match default_config_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        },
    };
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&cli.args);

    let log_dir = config_dir.join("logs");
    cairn_log::init_logging(Some(&log_dir), config.debug.file_logging, Some(&config));

    match run(&cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: &Command, config: &Config) -> Result<(), AppError> {
    match command {
        Command::Inspect { file } => {
            let scale = BrightnessScale::new(config.lighting.max_brightness)?;
            commands::inspect(file, scale, &mut std::io::stdout().lock())
        }
        Command::Tick => {
            let state = commands::tick(config)?;
            println!("tick {}", state.tick);
            Ok(())
        }
    }
}
