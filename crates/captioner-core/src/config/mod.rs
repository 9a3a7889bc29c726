//! Configuration management for the captioner.
//!
//! Configuration is loaded from the platform config directory
//! (`~/.config/captioner/config.toml` on Linux) with documented defaults.
//! Every section implements `Default`, so a partial file is always valid TOML
//! for this struct.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Artifact file locations
    pub artifacts: ArtifactsConfig,

    /// Caption model settings
    pub model: ModelConfig,

    /// Greedy decoding settings
    pub decoding: DecodingConfig,

    /// Image file store settings
    pub images: ImagesConfig,

    /// Debug preview settings
    pub preview: PreviewConfig,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.captioner.captioner/config.toml
    /// - Linux: ~/.config/captioner/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\captioner\config\config.toml
    ///
    /// Falls back to ~/.captioner/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "captioner", "captioner")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".captioner").join("config.toml")
            })
    }

    /// Get the resolved data directory (with ~ expansion).
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }

    /// Resolved path of the ONNX caption model.
    pub fn model_path(&self) -> PathBuf {
        self.artifact_path(&self.artifacts.model)
    }

    /// Resolved path of the feature mapping.
    pub fn features_path(&self) -> PathBuf {
        self.artifact_path(&self.artifacts.features)
    }

    /// Resolved path of the tokenizer.
    pub fn tokenizer_path(&self) -> PathBuf {
        self.artifact_path(&self.artifacts.tokenizer)
    }

    /// Resolved image directory.
    pub fn images_dir(&self) -> PathBuf {
        expand_tilde(&self.images.dir)
    }

    /// Resolved preview output directory.
    pub fn preview_dir(&self) -> PathBuf {
        expand_tilde(&self.preview.dir)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    fn artifact_path(&self, path: &Path) -> PathBuf {
        let expanded = expand_tilde(path);
        if expanded.is_absolute() {
            expanded
        } else {
            self.data_dir().join(expanded)
        }
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    let expanded = shellexpand::tilde(&path_str);
    PathBuf::from(expanded.into_owned())
}
