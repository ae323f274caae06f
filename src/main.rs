// SPDX-License-Identifier: GPL-3.0-only

use camera_capture::{Compression, PixelFormat};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "camera-capture")]
#[command(about = "Enumerate cameras and capture frames")]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also offer the in-memory test pattern cameras
    #[arg(long, global = true)]
    synthetic: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// List the capture modes of a camera
    Formats {
        /// Camera index to use (from 'camera-capture list')
        #[arg(short, long, default_value = "0")]
        camera: usize,

        /// Print the modes as JSON
        #[arg(long)]
        json: bool,
    },

    /// Capture a single frame and save it as an image
    Photo {
        /// Camera index to use (from 'camera-capture list')
        #[arg(short, long, default_value = "0")]
        camera: usize,

        /// Output file path; the extension picks the image format
        #[arg(short, long, default_value = "photo.png")]
        output: PathBuf,

        /// Only consider modes with this pixel format (e.g. YUYV, NV12)
        #[arg(long)]
        pixel_format: Option<PixelFormat>,

        /// Only consider modes of this width
        #[arg(long)]
        width: Option<u64>,

        /// Only consider modes at exactly this frame rate
        #[arg(long)]
        fps: Option<f64>,

        /// Capture compressed frames (MJPEG)
        #[arg(long)]
        compression: Option<Compression>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=camera_capture=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let mut config = cli::load_config(cli.config.as_deref())?;
    config.synthetic |= cli.synthetic;

    match cli.command {
        Commands::List => cli::list_cameras(&config),
        Commands::Formats { camera, json } => cli::list_formats(&config, camera, json),
        Commands::Photo {
            camera,
            output,
            pixel_format,
            width,
            fps,
            compression,
        } => {
            config.pixel_format = pixel_format.or(config.pixel_format);
            config.width = width.or(config.width);
            config.fps = fps.or(config.fps);
            config.compression = compression.or(config.compression);
            cli::take_photo(&config, camera, &output)
        }
    }
}
