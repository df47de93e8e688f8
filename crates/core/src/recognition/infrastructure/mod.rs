pub mod command_recognizer;
pub mod tessdata_resolver;
pub mod tesseract_recognizer;
