//! Error types for the captioning service.
//!
//! Startup failures (configuration, artifact loading) and per-request failures
//! (decoding a single caption) are kept in separate enums so the HTTP layer can
//! map request errors to status codes without ever seeing startup concerns.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for captioner operations.
#[derive(Error, Debug)]
pub enum CaptionerError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Artifact loading errors
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    /// Caption generation errors
    #[error("Caption error: {0}")]
    Caption(#[from] CaptionError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors raised while loading the artifacts the service depends on.
#[derive(Error, Debug)]
pub enum AssetError {
    /// Artifact file does not exist
    #[error("Artifact not found: {0}")]
    NotFound(PathBuf),

    /// Feature mapping could not be read or has the wrong shape
    #[error("Feature store error for {path}: {message}")]
    Features { path: PathBuf, message: String },

    /// Tokenizer could not be read or is inconsistent
    #[error("Tokenizer error for {path}: {message}")]
    Tokenizer { path: PathBuf, message: String },

    /// Caption model could not be loaded
    #[error("Model error for {path}: {message}")]
    Model { path: PathBuf, message: String },
}

/// Errors produced while captioning a single image.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptionError {
    /// No feature vector is stored for the image id
    #[error("Image not found: {image_id}")]
    ImageNotFound { image_id: String },

    /// The image file is missing or cannot be decoded
    #[error("Image file unavailable for {image_id} at {path}: {message}")]
    ImageFile {
        image_id: String,
        path: PathBuf,
        message: String,
    },

    /// The model predicted an index that has no word in the vocabulary
    #[error("Model produced index {index} which is not in the vocabulary")]
    UnknownIndex { index: usize },

    /// A word could not be encoded and the OOV policy forbids dropping it
    #[error("Word {word:?} is not in the vocabulary")]
    OutOfVocabulary { word: String },

    /// The caption model failed
    #[error("Model invocation failed: {message}")]
    Model { message: String },
}

impl CaptionError {
    /// Whether the failure is caused by data missing for the requested image,
    /// as opposed to a fault in the service itself.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CaptionError::ImageNotFound { .. } | CaptionError::ImageFile { .. }
        )
    }
}

/// Convenience type alias for captioner results.
pub type Result<T> = std::result::Result<T, CaptionerError>;

/// Convenience type alias for per-request caption results.
pub type CaptionResult<T> = std::result::Result<T, CaptionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        let err = CaptionError::ImageNotFound {
            image_id: "abc".into(),
        };
        assert!(err.is_not_found());

        let err = CaptionError::UnknownIndex { index: 7 };
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_error_messages_carry_context() {
        let err = CaptionError::ImageFile {
            image_id: "abc".into(),
            path: PathBuf::from("/images/abc.jpg"),
            message: "No such file".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("abc.jpg"));
        assert!(msg.contains("No such file"));

        let err: CaptionerError = AssetError::NotFound(PathBuf::from("/tmp/model.onnx")).into();
        assert!(err.to_string().contains("model.onnx"));
    }
}
