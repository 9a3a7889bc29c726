//! Caption model abstraction.
//!
//! The decoder only needs "given image features and the caption so far, give
//! me a distribution over the next word". `CaptionModel` is that seam; the
//! production implementation runs an ONNX export of the trained network.
//!
//! # Usage
//!
//! ```rust,ignore
//! use captioner_core::model::{CaptionModel, OnnxCaptionModel};
//!
//! let model = OnnxCaptionModel::load(&config.model_path(), &config.model)?;
//! let probabilities = model.predict(feature.as_slice(), &padded)?;
//! ```

mod onnx;

pub use onnx::OnnxCaptionModel;

use std::sync::Arc;

use crate::error::CaptionResult;

/// Predicts the next-word distribution for a partial caption.
///
/// Implementations are shared across requests, so they must be `Send + Sync`
/// and must not depend on call order.
pub trait CaptionModel: Send + Sync {
    /// Run one prediction.
    ///
    /// `feature` is the image feature vector; `sequence` is the padded index
    /// sequence of exactly the width the model was trained with. Returns one
    /// probability per vocabulary index.
    fn predict(&self, feature: &[f32], sequence: &[i64]) -> CaptionResult<Vec<f32>>;
}

impl<M: CaptionModel + ?Sized> CaptionModel for Arc<M> {
    fn predict(&self, feature: &[f32], sequence: &[i64]) -> CaptionResult<Vec<f32>> {
        (**self).predict(feature, sequence)
    }
}
