//! Captioner CLI - HTTP caption service for pre-extracted image features.
//!
//! Loads a trained caption model, a vocabulary and a feature mapping once,
//! then answers `POST /generate_caption` requests with greedily decoded
//! captions.
//!
//! # Usage
//!
//! ```bash
//! # Serve the HTTP endpoint
//! captioner serve --port 8080
//!
//! # Caption images directly
//! captioner caption 1000268201_56930d4e97
//!
//! # View configuration
//! captioner config show
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Captioner - greedy image caption generation over HTTP.
#[derive(Parser, Debug)]
#[command(name = "captioner")]
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
    #[arg(long, global = true, env = "CAPTIONER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the caption HTTP endpoint
    Serve(cli::serve::ServeArgs),

    /// Caption one or more image ids and print the results
    Caption(cli::caption::CaptionArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // An explicit --config must load; the default location falls back to
    // defaults. Logging isn't initialized yet, so warnings go to stderr.
    let config = match &cli.config {
        Some(path) => captioner_core::Config::load_from(path)?,
        None => match captioner_core::Config::load() {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to load config: {e}\n  \
                     Using default configuration. Check your config file with `captioner config path`."
                );
                captioner_core::Config::default()
            }
        },
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Captioner v{}", captioner_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Serve(args) => cli::serve::execute(args, config).await,
        Commands::Caption(args) => cli::caption::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, cli.config).await,
    }
}
