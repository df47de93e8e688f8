use std::path::Path;

use crate::shared::region::Region;
use crate::video::domain::image_writer::ImageWriter;

/// Writes a subtitle band to an image file using the `image` crate.
///
/// The format is picked from the path extension.
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Wraps region pixels in an `image` buffer. Only 3-channel RGB and
/// 1-channel grayscale are representable.
pub fn to_dynamic_image(region: &Region) -> Option<image::DynamicImage> {
    let data = region.data().to_vec();
    match region.channels() {
        3 => image::RgbImage::from_raw(region.width(), region.height(), data)
            .map(image::DynamicImage::ImageRgb8),
        1 => image::GrayImage::from_raw(region.width(), region.height(), data)
            .map(image::DynamicImage::ImageLuma8),
        _ => None,
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, region: &Region) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let img = to_dynamic_image(region).ok_or("Failed to create image from region data")?;
        img.save(path)?;
        Ok(())
    }
}
