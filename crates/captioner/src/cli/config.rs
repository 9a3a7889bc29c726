//! The `captioner config` command for configuration management.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use captioner_core::Config;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,

    /// Show config file path
    Path,

    /// Initialize a new config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command.
///
/// `explicit` is the `--config` path, when one was given.
pub async fn execute(args: ConfigArgs, explicit: Option<PathBuf>) -> anyhow::Result<()> {
    let path = explicit.unwrap_or_else(Config::default_path);

    match args.command {
        ConfigCommand::Show => {
            let config = if path.exists() {
                Config::load_from(&path)?
            } else {
                Config::default()
            };
            println!("{}", config.to_toml()?);
        }

        ConfigCommand::Path => {
            println!("{}", path.display());
        }

        ConfigCommand::Init { force } => {
            init(&path, force)?;
            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

/// Write a default config file, refusing to clobber one unless `force`.
fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let toml = Config::default().to_toml()?;
    std::fs::write(path, toml)?;
    Ok(())
}
