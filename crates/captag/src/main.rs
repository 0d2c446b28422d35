//! captag CLI - caption and keyword a folder of images with a vision model.
//!
//! Each image is described by an OpenAI-compatible vision endpoint; the
//! caption and tags are written back into the image itself (EXIF for JPEG,
//! text chunks for PNG) and a report is left in the folder.
//!
//! # Usage
//!
//! ```bash
//! # Caption every image in a folder
//! captag run ./photos
//!
//! # Pick the folder interactively, against a different server
//! captag run --url http://localhost:8080/v1/chat/completions
//!
//! # Show what is embedded in a file
//! captag inspect ./photos/beach.jpg
//!
//! # View configuration
//! captag config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// captag - caption and keyword images with a vision model.
#[derive(Parser, Debug)]
#[command(name = "captag")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "CAPTAG_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Caption, tag and embed every image in a folder
    Run(cli::run::RunArgs),

    /// Show the caption and keywords embedded in an image
    Inspect(cli::inspect::InspectArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match &cli.config {
        Some(path) => captag_core::Config::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load {}: {e}", path.display()))?,
        None => match captag_core::Config::load() {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to load config: {e}\n  \
                     Using default configuration. Check your config file with `captag config path`."
                );
                captag_core::Config::default()
            }
        },
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("captag v{}", captag_core::VERSION);

    match cli.command {
        Commands::Run(args) => cli::run::execute(args, config).await,
        Commands::Inspect(args) => cli::inspect::execute(args, &config),
        Commands::Config(args) => cli::config::execute(args, &config, cli.config.as_deref()),
    }
}
