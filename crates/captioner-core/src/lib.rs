//! Captioner Core - greedy image caption decoding.
//!
//! Given an image id, the captioner looks up the image's precomputed feature
//! vector and runs a trained caption model autoregressively, one word at a
//! time, until it predicts the end sentinel or runs out of steps.
//!
//! # Architecture
//!
//! ```text
//! image id → FeatureStore → GreedyDecoder ⇄ (Tokenizer, CaptionModel) → Caption
//! ```
//!
//! All artifacts are loaded once and shared read-only, so one `Captioner` can
//! serve concurrent requests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use captioner_core::{Captioner, Config};
//!
//! let config = Config::load()?;
//! let captioner = Captioner::load(&config)?;
//!
//! let caption = captioner.caption("1000268201_56930d4e97")?;
//! println!("{}", caption.text());
//! ```

// Module declarations
pub mod config;
pub mod decoder;
pub mod error;
pub mod features;
pub mod image_store;
pub mod math;
pub mod model;
pub mod preview;
pub mod server;
pub mod tokenizer;
pub mod types;

use std::sync::Arc;

// Re-exports for convenient access
pub use config::Config;
pub use decoder::GreedyDecoder;
pub use error::{AssetError, CaptionError, CaptionResult, CaptionerError, ConfigError, Result};
pub use features::{FeatureStore, FeatureVector};
pub use image_store::ImageStore;
pub use model::{CaptionModel, OnnxCaptionModel};
pub use preview::PreviewHook;
pub use tokenizer::Tokenizer;
pub use types::{Caption, CaptionRecord, StopReason};

use config::DecodingConfig;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Captioner - the main entry point for caption generation.
///
/// Owns the feature store, tokenizer and model for the process lifetime.
/// Dependencies are injected through [`Captioner::new`]; [`Captioner::load`]
/// builds them from configuration.
pub struct Captioner {
    features: FeatureStore,
    tokenizer: Tokenizer,
    model: Arc<dyn CaptionModel>,
    decoder: GreedyDecoder,
    images: Option<ImageStore>,
    require_image: bool,
    preview: Option<Arc<dyn PreviewHook>>,
}

impl Captioner {
    /// Assemble a captioner from already-loaded parts.
    pub fn new(
        features: FeatureStore,
        tokenizer: Tokenizer,
        model: Arc<dyn CaptionModel>,
        decoding: &DecodingConfig,
    ) -> Self {
        Self {
            features,
            tokenizer,
            model,
            decoder: GreedyDecoder::new(decoding),
            images: None,
            require_image: false,
            preview: None,
        }
    }

    /// Attach an image store. With `require` set, ids whose image file is
    /// missing or undecodable are rejected before decoding.
    pub fn with_images(mut self, images: ImageStore, require: bool) -> Self {
        self.images = Some(images);
        self.require_image = require;
        self
    }

    /// Attach a preview hook, called with the decoded image after each caption.
    pub fn with_preview(mut self, hook: Arc<dyn PreviewHook>) -> Self {
        self.preview = Some(hook);
        self
    }

    /// Load every artifact named by the configuration.
    pub fn load(config: &Config) -> Result<Self> {
        tracing::debug!("Initializing Captioner v{}", VERSION);

        let features = FeatureStore::load(&config.features_path(), config.model.feature_dim)?;

        let tokenizer_path = config.tokenizer_path();
        let tokenizer =
            Tokenizer::load(&tokenizer_path)?.with_oov_policy(config.decoding.oov_policy);
        for sentinel in [&config.decoding.start_token, &config.decoding.end_token] {
            if tokenizer.index_of(sentinel).is_none() {
                return Err(AssetError::Tokenizer {
                    path: tokenizer_path,
                    message: format!("Sentinel {sentinel:?} is not in the vocabulary"),
                }
                .into());
            }
        }

        let model_path = config.model_path();
        tracing::info!("Loading caption model from {:?}", model_path);
        let model = OnnxCaptionModel::load(&model_path, &config.model)?;
        tracing::info!("Caption model loaded successfully");

        let mut captioner = Self::new(features, tokenizer, Arc::new(model), &config.decoding);

        let hook = preview::from_config(config);
        if config.images.require_file || hook.is_some() {
            captioner = captioner
                .with_images(ImageStore::from_config(config), config.images.require_file);
        }
        if let Some(hook) = hook {
            captioner = captioner.with_preview(hook);
        }

        Ok(captioner)
    }

    /// Generate a caption for an image id.
    ///
    /// An unknown id fails with [`CaptionError::ImageNotFound`] before any
    /// model invocation.
    pub fn caption(&self, image_id: &str) -> CaptionResult<Caption> {
        let feature = self
            .features
            .lookup(image_id)
            .ok_or_else(|| CaptionError::ImageNotFound {
                image_id: image_id.to_string(),
            })?;

        let image = match &self.images {
            Some(store) if self.require_image => Some(store.load(image_id)?),
            Some(store) if self.preview.is_some() => match store.load(image_id) {
                Ok(image) => Some(image),
                Err(e) => {
                    tracing::warn!("Skipping preview: {}", e);
                    None
                }
            },
            _ => None,
        };

        let caption = self
            .decoder
            .decode(self.model.as_ref(), &self.tokenizer, feature.as_slice())?;

        if let (Some(hook), Some(image)) = (&self.preview, &image) {
            hook.on_caption(image_id, image, &caption);
        }

        Ok(caption)
    }

    pub fn features(&self) -> &FeatureStore {
        &self.features
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn decoder(&self) -> &GreedyDecoder {
        &self.decoder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testing::ScriptedModel;
    use crate::tokenizer::TextSettings;
    use image::DynamicImage;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // startseq=1 endseq=2 a=3 dog=4 runs=5
    fn tokenizer() -> Tokenizer {
        let word_index = ["startseq", "endseq", "a", "dog", "runs"]
            .iter()
            .enumerate()
            .map(|(i, w)| (w.to_string(), i as i64 + 1))
            .collect();
        Tokenizer::from_word_index(word_index, TextSettings::default()).unwrap()
    }

    fn features() -> FeatureStore {
        FeatureStore::from_map(
            HashMap::from([("1000268201_56930d4e97".to_string(), vec![0.5; 8])]),
            8,
        )
        .unwrap()
    }

    fn captioner(model: Arc<ScriptedModel>) -> Captioner {
        Captioner::new(features(), tokenizer(), model, &DecodingConfig::default())
    }

    #[derive(Default)]
    struct RecordingPreview(Mutex<Vec<String>>);

    impl PreviewHook for RecordingPreview {
        fn on_caption(&self, image_id: &str, _image: &DynamicImage, caption: &Caption) {
            self.0
                .lock()
                .unwrap()
                .push(format!("{image_id}: {}", caption.text()));
        }
    }

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_caption_known_image() {
        let model = Arc::new(ScriptedModel::new(vec![3, 4, 5, 2], 6));
        let caption = captioner(model.clone())
            .caption("1000268201_56930d4e97")
            .unwrap();
        assert_eq!(caption.text(), "a dog runs");
        assert_eq!(model.calls(), 4);
    }

    #[test]
    fn test_unknown_image_skips_model() {
        let model = Arc::new(ScriptedModel::new(vec![3, 2], 6));
        let err = captioner(model.clone()).caption("missing").unwrap_err();
        assert_eq!(
            err,
            CaptionError::ImageNotFound {
                image_id: "missing".into()
            }
        );
        assert_eq!(model.calls(), 0);
    }

    #[test]
    fn test_required_image_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(ScriptedModel::new(vec![3, 2], 6));
        let captioner =
            captioner(model.clone()).with_images(ImageStore::new(dir.path(), "jpg", 10000), true);

        let err = captioner.caption("1000268201_56930d4e97").unwrap_err();
        assert!(matches!(err, CaptionError::ImageFile { .. }));
        assert_eq!(model.calls(), 0);
    }

    #[test]
    fn test_preview_receives_caption() {
        let dir = tempfile::tempdir().unwrap();
        DynamicImage::new_rgb8(8, 8)
            .save_with_format(
                dir.path().join("1000268201_56930d4e97.jpg"),
                image::ImageFormat::Png,
            )
            .unwrap();

        let preview = Arc::new(RecordingPreview::default());
        let captioner = captioner(Arc::new(ScriptedModel::new(vec![4, 5, 2], 6)))
            .with_images(ImageStore::new(dir.path(), "jpg", 10000), false)
            .with_preview(preview.clone());

        captioner.caption("1000268201_56930d4e97").unwrap();
        assert_eq!(
            preview.0.lock().unwrap().as_slice(),
            &["1000268201_56930d4e97: dog runs".to_string()]
        );
    }

    #[test]
    fn test_preview_failure_does_not_fail_caption() {
        let dir = tempfile::tempdir().unwrap();
        let preview = Arc::new(RecordingPreview::default());
        let captioner = captioner(Arc::new(ScriptedModel::new(vec![4, 2], 6)))
            .with_images(ImageStore::new(dir.path(), "jpg", 10000), false)
            .with_preview(preview.clone());

        let caption = captioner.caption("1000268201_56930d4e97").unwrap();
        assert_eq!(caption.text(), "dog");
        assert!(preview.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.general.data_dir = dir.path().to_path_buf();

        let err = Captioner::load(&config).err().unwrap();
        assert!(matches!(err, CaptionerError::Asset(AssetError::NotFound(_))));
    }

    #[test]
    fn test_load_rejects_vocabulary_without_sentinels() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("features.json"), r#"{"a": [0.1]}"#).unwrap();
        std::fs::write(dir.path().join("tokenizer.json"), r#"{"startseq": 1, "dog": 2}"#).unwrap();

        let mut config = Config::default();
        config.general.data_dir = dir.path().to_path_buf();
        config.model.feature_dim = 1;

        let err = Captioner::load(&config).err().unwrap();
        assert!(err.to_string().contains("endseq"));
    }
}
