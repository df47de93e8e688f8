/// Mean squared error below which two consecutive bands belong to one cue.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 100.0;

/// Default subtitle band, as fractions of the frame height.
pub const DEFAULT_REGION_TOP: f64 = 0.86;
pub const DEFAULT_REGION_BOTTOM: f64 = 0.94;

pub const DEFAULT_LANGUAGES: &[&str] = &["chi_sim", "eng"];

pub const TESSERACT_BINARY: &str = "tesseract";

/// Tesseract page segmentation mode 7: treat the image as a single text line.
pub const TESSERACT_SINGLE_LINE_PSM: u8 = 7;

/// `{}` is replaced by the language code.
pub const TESSDATA_URL_TEMPLATE: &str =
    "https://raw.githubusercontent.com/tesseract-ocr/tessdata/master/{}.traineddata";

pub const TESSDATA_EXTENSION: &str = "traineddata";
