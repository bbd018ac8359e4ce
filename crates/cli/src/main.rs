//! tsctl - Teslasuit Control CLI
//!
//! Discover suits and gloves, play haptic assets on a slot, and watch
//! motion-capture or PPG data from the command line.

#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod completion;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use teslasuit_api::INSTALL_DIR_ENV;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{DevicesArgs, PlayArgs, StreamArgs};

#[derive(Parser)]
#[command(name = "tsctl")]
#[command(about = "Teslasuit Control CLI - Discover devices, play haptics and stream sensor data")]
#[command(version)]
#[command(long_about = "
tsctl drives Teslasuit suits and gloves through the vendor library.
It loads the library from the install directory, assigns discovered devices
to slots 0-7, and offers one-shot haptic playback and live mocap/PPG readouts.

Use --json flag for machine-readable output suitable for scripting.
")]
struct Cli {
    /// Output format (human-readable or JSON)
    #[arg(
        long,
        global = true,
        help = "Output in JSON format for machine parsing"
    )]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Runtime configuration file (.yaml, .yml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Vendor library install directory
    #[arg(long, global = true, env = INSTALL_DIR_ENV)]
    install_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List devices and their slots
    Devices(DevicesArgs),

    /// Play a haptic asset on the device in a slot
    Play(PlayArgs),

    /// Stream skeleton data from the device in a slot
    Mocap(StreamArgs),

    /// Stream heart rate and oxygen saturation from the device in a slot
    Ppg(StreamArgs),

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "tsctl={log_level},teslasuit_api={log_level},teslasuit_device={log_level},\
                     teslasuit_haptics={log_level},teslasuit_streaming={log_level},\
                     teslasuit_runtime={log_level}"
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    match execute_command(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }
            ExitCode::from(error::exit_code(&e))
        }
    }
}

fn execute_command(cli: &Cli) -> Result<()> {
    let ctx = commands::Context {
        json: cli.json,
        config: cli.config.clone(),
        install_dir: cli.install_dir.clone(),
    };
    match &cli.command {
        Commands::Devices(args) => commands::devices::execute(&ctx, args),
        Commands::Play(args) => commands::play::execute(&ctx, args),
        Commands::Mocap(args) => commands::stream::execute_mocap(&ctx, args),
        Commands::Ppg(args) => commands::stream::execute_ppg(&ctx, args),
        Commands::Completion { shell } => {
            completion::generate_completion(*shell);
            Ok(())
        }
    }
}
