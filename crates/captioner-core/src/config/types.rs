//! Sub-configuration structs with their documented defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the model, feature and tokenizer artifacts
    pub data_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("~/.captioner"),
        }
    }
}

/// Artifact file locations, relative to `general.data_dir` unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// Caption model exported to ONNX
    pub model: PathBuf,

    /// Precomputed feature mapping (JSON object of image id -> vector)
    pub features: PathBuf,

    /// Vocabulary (Keras tokenizer JSON or plain word index)
    pub tokenizer: PathBuf,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            model: PathBuf::from("model.onnx"),
            features: PathBuf::from("features.json"),
            tokenizer: PathBuf::from("tokenizer.json"),
        }
    }
}

/// Element type of the token sequence tensor fed to the model.
///
/// Keras `Input` layers default to float32, so converted models usually take
/// the padded sequence as floats even though the values are word indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SequenceDType {
    #[default]
    Float32,
    Int64,
}

/// Caption model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Name of the image feature input tensor (detected when unset)
    pub feature_input: Option<String>,

    /// Name of the token sequence input tensor (detected when unset)
    pub sequence_input: Option<String>,

    /// Name of the next-word distribution output (first output when unset)
    pub output: Option<String>,

    /// Element type of the sequence input
    pub sequence_dtype: SequenceDType,

    /// Length of each image feature vector
    pub feature_dim: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            feature_input: None,
            sequence_input: None,
            output: None,
            sequence_dtype: SequenceDType::Float32,
            feature_dim: 4096,
        }
    }
}

/// What to do with words that have no vocabulary index when encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OovPolicy {
    /// Skip the word (or map it to the tokenizer's OOV token if it has one)
    #[default]
    Drop,
    /// Fail the request
    Error,
}

/// Greedy decoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodingConfig {
    /// Maximum number of decoding steps (and so of generated words)
    pub max_length: usize,

    /// Width the token sequence is padded or truncated to.
    /// Must match the sequence input the model was trained with.
    pub sequence_width: usize,

    /// Sentinel that starts every sequence
    pub start_token: String,

    /// Sentinel that ends a caption
    pub end_token: String,

    /// Handling of out-of-vocabulary words during encoding
    pub oov_policy: OovPolicy,
}

impl Default for DecodingConfig {
    fn default() -> Self {
        Self {
            max_length: 34,
            sequence_width: 35,
            start_token: "startseq".to_string(),
            end_token: "endseq".to_string(),
            oov_policy: OovPolicy::Drop,
        }
    }
}

/// Image file store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    /// Directory containing `<image_id>.<extension>` files
    pub dir: PathBuf,

    /// File extension appended to the image id
    pub extension: String,

    /// Fail requests whose image file is missing or undecodable
    pub require_file: bool,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("~/.captioner/images"),
            extension: "jpg".to_string(),
            require_file: false,
            max_image_dimension: 10000,
        }
    }
}

/// Preview hook selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PreviewMode {
    #[default]
    Off,
    Log,
    Thumbnail,
}

/// Debug preview of captioned images.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Which preview hook to run after a caption is produced
    pub mode: PreviewMode,

    /// Output directory for thumbnail previews
    pub dir: PathBuf,

    /// Thumbnail size in pixels (longest edge)
    pub size: u32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            mode: PreviewMode::Off,
            dir: PathBuf::from("~/.captioner/previews"),
            size: 256,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// Port to bind
    pub port: u16,

    /// Answer unknown image ids with 200 and the caption "Image not found."
    /// instead of a 404 error.
    pub legacy_not_found_caption: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 80,
            legacy_not_found_caption: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
