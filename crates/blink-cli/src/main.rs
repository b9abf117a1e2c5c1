use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod gray;
mod menu;
mod session;
mod signal;

use config::Config;
use signal::Interrupt;

#[derive(Parser)]
#[command(name = "blink", about = "Count eye blinks from facial landmark streams")]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/blink/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Blink ratio above which eyes count as closed
    #[arg(short, long, global = true)]
    threshold: Option<f32>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Count blinks in a landmark stream (JSON lines; "-" for stdin)
    Count {
        source: String,
        /// Print the session summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report the number of faces in each frame of a landmark stream
    Faces {
        source: String,
    },
    /// Capture raw grayscale frames from the camera
    Gray {
        /// V4L2 device (default from config)
        #[arg(short, long)]
        device: Option<String>,
        /// Number of frames to capture
        #[arg(short = 'n', long)]
        frames: Option<usize>,
        /// Directory to write PNG frames into
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// List V4L2 capture devices
    Devices,
    /// Interactive menu (default)
    Menu,
}

fn run(command: Commands, config: &Config, interrupt: &Interrupt) -> Result<()> {
    let stdout = std::io::stdout();

    match command {
        Commands::Count { source, json } => {
            let reader = session::open_landmarks(&source)?;
            if json {
                let summary = session::count_blinks(reader, config, interrupt, &mut std::io::sink())?;
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                let mut out = stdout.lock();
                let summary = session::count_blinks(reader, config, interrupt, &mut out)?;
                session::print_summary(&summary, &mut out)?;
            }
        }
        Commands::Faces { source } => {
            let reader = session::open_landmarks(&source)?;
            let summary = session::count_faces(reader, config, interrupt, &mut stdout.lock())?;
            if summary.end == blink_core::SessionEnd::Interrupted {
                println!("Frame capturing stopped.");
            }
            println!(
                "{} frames, {} with a face, at most {} faces in one frame",
                summary.frames, summary.frames_with_face, summary.max_faces
            );
        }
        Commands::Gray { device, frames, out } => {
            let device = device.unwrap_or_else(|| config.camera_device.clone());
            let count = frames.unwrap_or(config.gray_frames);
            let captured = gray::capture_gray(&device, count, out.as_deref(), interrupt)?;
            println!("Captured {captured} grayscale frames from {device}");
        }
        Commands::Devices => {
            let devices = blink_hw::Camera::list_devices();
            if devices.is_empty() {
                println!("No V4L2 capture devices found");
            }
            for d in devices {
                println!("{}  {} ({}, {})", d.path, d.name, d.driver, d.bus);
            }
        }
        Commands::Menu => {
            let stdin = std::io::stdin();
            menu::run_menu(stdin.lock(), &mut stdout.lock(), config, interrupt)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(t) = cli.threshold {
        config.threshold = t;
    }
    config.validate()?;
    tracing::debug!(?config, "configuration");

    let interrupt = Interrupt::default();
    signal::spawn_listener(interrupt.clone());

    let command = cli.command.unwrap_or(Commands::Menu);
    tokio::task::spawn_blocking(move || run(command, &config, &interrupt)).await?
}
