use std::path::Path;

use crate::shared::region::Region;

/// Writes a subtitle band to an image file.
pub trait ImageWriter: Send {
    fn write(&self, path: &Path, region: &Region) -> Result<(), Box<dyn std::error::Error>>;
}
