//! Optional preview hooks run after a caption is produced.
//!
//! Previews are a debugging aid: they see the decoded image and its caption
//! but cannot influence the response, and their failures are only logged.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Config, PreviewMode};
use crate::types::Caption;

/// Receives every successfully captioned image.
pub trait PreviewHook: Send + Sync {
    fn on_caption(&self, image_id: &str, image: &DynamicImage, caption: &Caption);
}

/// Logs the caption with the image dimensions.
pub struct LogPreview;

impl PreviewHook for LogPreview {
    fn on_caption(&self, image_id: &str, image: &DynamicImage, caption: &Caption) {
        let (width, height) = image.dimensions();
        tracing::info!(
            image_id,
            width,
            height,
            caption = %caption.text(),
            "Captioned image"
        );
    }
}

/// Writes `<image_id>.webp` thumbnails and `<image_id>.txt` captions to a
/// directory for later inspection.
pub struct ThumbnailPreview {
    dir: PathBuf,
    size: u32,
}

impl ThumbnailPreview {
    pub fn new(dir: impl Into<PathBuf>, size: u32) -> Self {
        Self {
            dir: dir.into(),
            size,
        }
    }

    /// Encode a thumbnail as WebP bytes (longest edge = `size`).
    pub fn thumbnail_bytes(&self, image: &DynamicImage) -> Option<Vec<u8>> {
        let thumbnail = image.thumbnail(self.size, self.size);

        let mut buffer = std::io::Cursor::new(Vec::new());
        thumbnail.write_to(&mut buffer, ImageFormat::WebP).ok()?;

        Some(buffer.into_inner())
    }

    fn write(&self, image_id: &str, image: &DynamicImage, caption: &Caption) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        if let Some(bytes) = self.thumbnail_bytes(image) {
            std::fs::write(self.dir.join(format!("{image_id}.webp")), bytes)?;
        }
        std::fs::write(self.dir.join(format!("{image_id}.txt")), caption.text())
    }
}

impl PreviewHook for ThumbnailPreview {
    fn on_caption(&self, image_id: &str, image: &DynamicImage, caption: &Caption) {
        if let Err(e) = self.write(image_id, image, caption) {
            tracing::warn!("Failed to write preview for {}: {}", image_id, e);
        }
    }
}

/// Build the preview hook selected in the configuration, if any.
pub fn from_config(config: &Config) -> Option<Arc<dyn PreviewHook>> {
    match config.preview.mode {
        PreviewMode::Off => None,
        PreviewMode::Log => Some(Arc::new(LogPreview)),
        PreviewMode::Thumbnail => Some(Arc::new(ThumbnailPreview::new(
            config.preview_dir(),
            config.preview.size,
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StopReason;

    fn caption() -> Caption {
        Caption {
            words: vec!["two".into(), "dogs".into()],
            steps: 3,
            stop_reason: StopReason::EndToken,
        }
    }

    #[test]
    fn test_thumbnail_bytes_are_webp() {
        let preview = ThumbnailPreview::new("/unused", 64);
        let bytes = preview
            .thumbnail_bytes(&DynamicImage::new_rgb8(200, 100))
            .unwrap();
        // WebP files start with "RIFF"
        assert_eq!(&bytes[0..4], b"RIFF");
    }

    #[test]
    fn test_thumbnail_preview_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("previews");
        let preview = ThumbnailPreview::new(&out, 32);

        preview.on_caption("img_1", &DynamicImage::new_rgb8(100, 50), &caption());

        assert!(out.join("img_1.webp").exists());
        assert_eq!(
            std::fs::read_to_string(out.join("img_1.txt")).unwrap(),
            "two dogs"
        );
    }

    #[test]
    fn test_from_config_selects_hook() {
        let mut config = Config::default();
        assert!(from_config(&config).is_none());

        config.preview.mode = PreviewMode::Log;
        assert!(from_config(&config).is_some());

        config.preview.mode = PreviewMode::Thumbnail;
        assert!(from_config(&config).is_some());
    }
}
