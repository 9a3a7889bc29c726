//! Image files addressed by image id.
//!
//! Images live at `<dir>/<image_id>.<extension>`. Captioning works from the
//! precomputed features alone; the file is only read when the service is
//! configured to require it or when a preview hook wants the pixels.

use image::{DynamicImage, GenericImageView};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{CaptionError, CaptionResult};

/// Resolves and decodes image files for image ids.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    extension: String,
    max_dimension: u32,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>, max_dimension: u32) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
            max_dimension,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.images_dir(),
            config.images.extension.clone(),
            config.images.max_image_dimension,
        )
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for an image id.
    pub fn path_for(&self, image_id: &str) -> PathBuf {
        self.dir.join(format!("{image_id}.{}", self.extension))
    }

    /// Read and decode the image for an id.
    ///
    /// Ids that would escape the image directory are rejected before touching
    /// the filesystem.
    pub fn load(&self, image_id: &str) -> CaptionResult<DynamicImage> {
        let path = self.path_for(image_id);
        let fail = |message: String| CaptionError::ImageFile {
            image_id: image_id.to_string(),
            path: path.clone(),
            message,
        };

        if !is_plain_id(image_id) {
            return Err(fail("Image id must be a plain file name".to_string()));
        }
        if !path.is_file() {
            return Err(fail("No such file".to_string()));
        }

        let reader = image::ImageReader::open(&path)
            .map_err(|e| fail(format!("Cannot open image: {e}")))?
            .with_guessed_format()
            .map_err(|e| fail(format!("Cannot detect image format: {e}")))?;
        let image = reader.decode().map_err(|e| fail(e.to_string()))?;

        let (width, height) = image.dimensions();
        if width > self.max_dimension || height > self.max_dimension {
            return Err(fail(format!(
                "Image too large ({width}x{height} > {})",
                self.max_dimension
            )));
        }

        tracing::debug!("Decoded {:?} ({}x{})", path, width, height);
        Ok(image)
    }
}

fn is_plain_id(image_id: &str) -> bool {
    !image_id.is_empty()
        && image_id != "."
        && image_id != ".."
        && !image_id.contains(['/', '\\', '\0'])
}
