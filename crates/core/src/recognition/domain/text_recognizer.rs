use crate::shared::region::Region;

/// Domain interface for optical character recognition.
///
/// Implementations take a subtitle band and return whatever text they read,
/// possibly empty. Calls are independent of one another.
pub trait TextRecognizer: Send {
    fn recognize(&self, region: &Region) -> Result<String, Box<dyn std::error::Error>>;
}
