//! ONNX Runtime session for the caption model.
//!
//! The model is the trained merge network (image features + partial caption ->
//! next-word distribution) exported to ONNX. It takes two inputs, a
//! `[1, feature_dim]` float feature tensor and a `[1, sequence_width]` padded
//! index tensor, and produces a `[1, vocab_size]` probability tensor.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Value;

use crate::config::{ModelConfig, SequenceDType};
use crate::error::{AssetError, CaptionError, CaptionResult};

use super::CaptionModel;

/// Wraps an ONNX Runtime session for caption prediction.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
pub struct OnnxCaptionModel {
    session: Mutex<Session>,
    feature_input: String,
    sequence_input: String,
    output: Option<String>,
    sequence_dtype: SequenceDType,
}

impl OnnxCaptionModel {
    /// Load the caption model from an ONNX file.
    ///
    /// Input names come from the config when set; otherwise the first model
    /// input is taken as the image features and the second as the sequence,
    /// matching the order the network was built with.
    pub fn load(model_path: &Path, config: &ModelConfig) -> Result<Self, AssetError> {
        if !model_path.exists() {
            return Err(AssetError::NotFound(model_path.to_path_buf()));
        }

        let session = Session::builder()
            .map_err(|e| AssetError::Model {
                path: model_path.to_path_buf(),
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(model_path)
            .map_err(|e| AssetError::Model {
                path: model_path.to_path_buf(),
                message: format!("Failed to load ONNX model: {e}"),
            })?;

        let input_names: Vec<String> = session
            .inputs()
            .iter()
            .map(|i| i.name().to_string())
            .collect();

        let pick = |configured: &Option<String>, position: usize, role: &str| {
            match configured {
                Some(name) if input_names.contains(name) => Ok(name.clone()),
                Some(name) => Err(AssetError::Model {
                    path: model_path.to_path_buf(),
                    message: format!(
                        "Configured {role} input {name:?} not found (model inputs: {input_names:?})"
                    ),
                }),
                None => input_names
                    .get(position)
                    .cloned()
                    .ok_or_else(|| AssetError::Model {
                        path: model_path.to_path_buf(),
                        message: format!(
                            "Expected two model inputs, found {input_names:?}"
                        ),
                    }),
            }
        };

        let feature_input = pick(&config.feature_input, 0, "feature")?;
        let sequence_input = pick(&config.sequence_input, 1, "sequence")?;

        tracing::debug!(
            "Loaded caption model from {:?} (feature input: {:?}, sequence input: {:?}, outputs: {:?})",
            model_path,
            feature_input,
            sequence_input,
            session
                .outputs()
                .iter()
                .map(|o| o.name())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            session: Mutex::new(session),
            feature_input,
            sequence_input,
            output: config.output.clone(),
            sequence_dtype: config.sequence_dtype,
        })
    }
}

fn model_err(message: String) -> CaptionError {
    CaptionError::Model { message }
}

impl CaptionModel for OnnxCaptionModel {
    fn predict(&self, feature: &[f32], sequence: &[i64]) -> CaptionResult<Vec<f32>> {
        let feature_value = Value::from_array((vec![1i64, feature.len() as i64], feature.to_vec()))
            .map_err(|e| model_err(format!("Failed to create feature tensor: {e}")))?;
        let sequence_shape = vec![1i64, sequence.len() as i64];

        let mut session = self
            .session
            .lock()
            .map_err(|e| model_err(format!("Session lock poisoned: {e}")))?;

        let outputs = match self.sequence_dtype {
            SequenceDType::Float32 => {
                let values: Vec<f32> = sequence.iter().map(|&i| i as f32).collect();
                let sequence_value = Value::from_array((sequence_shape, values))
                    .map_err(|e| model_err(format!("Failed to create sequence tensor: {e}")))?;
                session.run(ort::inputs![
                    self.feature_input.as_str() => feature_value,
                    self.sequence_input.as_str() => sequence_value,
                ])
            }
            SequenceDType::Int64 => {
                let sequence_value = Value::from_array((sequence_shape, sequence.to_vec()))
                    .map_err(|e| model_err(format!("Failed to create sequence tensor: {e}")))?;
                session.run(ort::inputs![
                    self.feature_input.as_str() => feature_value,
                    self.sequence_input.as_str() => sequence_value,
                ])
            }
        }
        .map_err(|e| model_err(format!("ONNX inference failed: {e}")))?;

        let output = match &self.output {
            Some(name) => outputs.iter().find(|(n, _)| *n == name.as_str()),
            None => outputs.iter().next(),
        }
        .ok_or_else(|| model_err("Model did not produce the expected output".to_string()))?;

        let (shape, data) = output
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| model_err(format!("Failed to extract output tensor: {e}")))?;

        // Output is [1, vocab_size]; take the single row.
        match shape.len() {
            1 => Ok(data.to_vec()),
            2 => {
                let dim = shape[1] as usize;
                Ok(data[..dim].to_vec())
            }
            _ => Err(model_err(format!("Unexpected output shape: {:?}", shape))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_model_file() {
        let err = OnnxCaptionModel::load(
            Path::new("/nonexistent/model.onnx"),
            &ModelConfig::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, AssetError::NotFound(_)));
    }

    #[test]
    fn test_load_rejects_garbage_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"not an onnx graph").unwrap();

        let err = OnnxCaptionModel::load(&path, &ModelConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, AssetError::Model { .. }));
    }
}
