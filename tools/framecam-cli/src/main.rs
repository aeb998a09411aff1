//! FrameCam CLI: inspect compositions and bake camera paths.
//!
//! Usage:
//!   framecam init <NAME>          Create an empty composition bundle
//!   framecam validate <PATH>      Validate a composition bundle
//!   framecam info <PATH>          Show composition information
//!   framecam path <PATH>          Bake the camera path (JSON or CSS preview)
//!   framecam snapshot <PATH>      Print the resolved snapshot for one frame
//!   framecam drift-sim <PATH>     Replay playback against a simulated media element

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use framecam_common::config::FramecamConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "framecam",
    about = "Camera path and frame layout resolution for screen-recording compositions",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PathFormat {
    /// Full camera path as JSON
    Json,
    /// One CSS transform per preview sample
    Css,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new empty composition bundle
    Init {
        /// Composition name
        name: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Composition width
        #[arg(long, default_value = "1920")]
        width: u32,

        /// Composition height
        #[arg(long, default_value = "1080")]
        height: u32,

        /// Composition frame rate
        #[arg(long, default_value = "30")]
        fps: f64,
    },

    /// Validate a composition bundle
    Validate {
        /// Path to the composition directory
        path: PathBuf,
    },

    /// Show composition information
    Info {
        /// Path to the composition directory
        path: PathBuf,
    },

    /// Bake the camera path for a composition
    Path {
        /// Path to the composition directory
        path: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: PathFormat,

        /// Preview sample rate for CSS output
        #[arg(long, default_value = "30")]
        sample_fps: f64,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Step by wall time instead of fixed frame steps
        #[arg(long)]
        live: bool,
    },

    /// Print the resolved snapshot for one frame
    Snapshot {
        /// Path to the composition directory
        path: PathBuf,

        /// Composition frame index
        #[arg(short, long)]
        frame: u32,

        /// Override the configured crossfade window (ms)
        #[arg(long)]
        crossfade_ms: Option<f64>,
    },

    /// Replay playback against a simulated media element
    DriftSim {
        /// Path to the composition directory
        path: PathBuf,

        /// Initial playhead lag of the media element (ms)
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        lag_ms: f64,

        /// Relative speed error of the media element (0.02 = 2% fast)
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        rate_error: f64,

        /// Frames the simulated seek takes to complete
        #[arg(long, default_value = "3")]
        seek_latency_frames: u32,

        /// Scrub to this frame halfway through the run
        #[arg(long)]
        scrub_to: Option<u32>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => FramecamConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display()))?,
        None => FramecamConfig::load(),
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    framecam_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Init {
            name,
            output,
            width,
            height,
            fps,
        } => commands::init::run(name, output, width, height, fps),
        Commands::Validate { path } => commands::validate::run(path),
        Commands::Info { path } => commands::info::run(path),
        Commands::Path {
            path,
            format,
            sample_fps,
            output,
            live,
        } => commands::path::run(&config, path, format, sample_fps, output, live),
        Commands::Snapshot {
            path,
            frame,
            crossfade_ms,
        } => commands::snapshot::run(&config, path, frame, crossfade_ms),
        Commands::DriftSim {
            path,
            lag_ms,
            rate_error,
            seek_latency_frames,
            scrub_to,
        } => commands::drift_sim::run(
            &config,
            path,
            lag_ms,
            rate_error,
            seek_latency_frames,
            scrub_to,
        ),
    }
}
