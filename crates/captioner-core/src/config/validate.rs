//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];
const LOG_FORMATS: &[&str] = &["pretty", "json"];

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decoding.max_length == 0 {
            return Err(ConfigError::ValidationError(
                "decoding.max_length must be > 0".into(),
            ));
        }
        if self.decoding.sequence_width == 0 {
            return Err(ConfigError::ValidationError(
                "decoding.sequence_width must be > 0".into(),
            ));
        }
        if self.decoding.start_token.trim().is_empty() || self.decoding.end_token.trim().is_empty()
        {
            return Err(ConfigError::ValidationError(
                "decoding.start_token and decoding.end_token must not be empty".into(),
            ));
        }
        if self.decoding.start_token == self.decoding.end_token {
            return Err(ConfigError::ValidationError(
                "decoding.start_token and decoding.end_token must differ".into(),
            ));
        }
        if self.model.feature_dim == 0 {
            return Err(ConfigError::ValidationError(
                "model.feature_dim must be > 0".into(),
            ));
        }
        if self.images.extension.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "images.extension must not be empty".into(),
            ));
        }
        if self.images.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "images.max_image_dimension must be > 0".into(),
            ));
        }
        if self.preview.size == 0 {
            return Err(ConfigError::ValidationError(
                "preview.size must be > 0".into(),
            ));
        }
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level must be one of {:?}",
                LOG_LEVELS
            )));
        }
        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.format must be one of {:?}",
                LOG_FORMATS
            )));
        }
        Ok(())
    }
}
