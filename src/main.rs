// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "qrscan")]
#[command(about = "Decode, replay and generate QR codes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a QR code from an image file
    Decode {
        /// Image file (PNG, JPEG, ...)
        image: PathBuf,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Replay a directory of frames through the live scanning pipeline
    Scan {
        /// Directory of image files, replayed in name order
        dir: PathBuf,

        /// Sensor rotation in degrees (multiple of 90)
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        rotation: i32,

        /// Replay frame rate
        #[arg(long, default_value = "30")]
        fps: f32,

        /// Preview view size in pixels, WIDTHxHEIGHT
        #[arg(long, default_value = "1080x1920")]
        view: String,

        /// Pixels per density-independent pixel
        #[arg(long, default_value = "1.0")]
        density: f32,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Generate a QR code image
    Generate {
        /// Text or URL to encode (ignored with --wifi-ssid)
        #[arg(required_unless_present = "wifi_ssid")]
        payload: Option<String>,

        /// Encode WiFi credentials for this network instead of a payload
        #[arg(long)]
        wifi_ssid: Option<String>,

        /// WiFi password
        #[arg(long)]
        wifi_password: Option<String>,

        /// WiFi security: WPA, WEP or nopass
        #[arg(long, default_value = "WPA")]
        wifi_security: String,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,

        /// Image side in pixels
        #[arg(short, long, default_value = "512")]
        size: u32,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=qrscan=trace, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Decode { image, config } => cli::decode_image(&image, config.as_deref()),
        Commands::Scan {
            dir,
            rotation,
            fps,
            view,
            density,
            config,
        } => cli::scan_directory(&dir, rotation, fps, &view, density, config.as_deref()),
        Commands::Generate {
            payload,
            wifi_ssid,
            wifi_password,
            wifi_security,
            output,
            size,
        } => {
            let payload = cli::build_payload(payload, wifi_ssid, wifi_password, &wifi_security)?;
            cli::generate_code(&payload, &output, size)
        }
    }
}
