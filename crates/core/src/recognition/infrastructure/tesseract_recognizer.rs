use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::command_recognizer::run_on_region_image;
use super::tessdata_resolver;
use crate::recognition::domain::text_recognizer::TextRecognizer;
use crate::shared::constants::{TESSERACT_BINARY, TESSERACT_SINGLE_LINE_PSM};
use crate::shared::region::Region;

#[derive(Debug, Clone, PartialEq)]
pub struct TesseractConfig {
    pub binary: PathBuf,
    pub languages: Vec<String>,
    pub tessdata_dir: Option<PathBuf>,
    pub page_segmentation_mode: u8,
}

impl TesseractConfig {
    pub fn new(languages: Vec<String>) -> Self {
        Self {
            binary: PathBuf::from(TESSERACT_BINARY),
            languages,
            tessdata_dir: None,
            page_segmentation_mode: TESSERACT_SINGLE_LINE_PSM,
        }
    }
}

/// Text recognizer that shells out to the Tesseract command-line tool.
///
/// Each cue's band is written to a temporary PNG and passed to
/// `tesseract <image> stdout -l <lang+lang> --psm <mode>`.
#[derive(Debug)]
pub struct TesseractRecognizer {
    config: TesseractConfig,
}

impl TesseractRecognizer {
    /// Checks that the binary runs and, when a tessdata directory is given,
    /// that it holds every requested language.
    pub fn new(config: TesseractConfig) -> Result<Self, Box<dyn std::error::Error>> {
        if config.languages.is_empty() {
            return Err("At least one recognition language is required".into());
        }

        let probe = Command::new(&config.binary)
            .arg("--version")
            .output()
            .map_err(|e| {
                format!(
                    "Tesseract not available at '{}': {e}",
                    config.binary.display()
                )
            })?;
        if !probe.status.success() {
            return Err(format!(
                "Tesseract at '{}' failed to report its version",
                config.binary.display()
            )
            .into());
        }

        if let Some(dir) = &config.tessdata_dir {
            tessdata_resolver::verify(dir, &config.languages)?;
        }

        log::info!(
            "Using Tesseract ({}) with languages {}",
            config.binary.display(),
            config.languages.join("+")
        );
        Ok(Self { config })
    }

    fn arguments(&self, image: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        if let Some(dir) = &self.config.tessdata_dir {
            args.push("--tessdata-dir".into());
            args.push(dir.into());
        }
        args.push(image.into());
        args.push("stdout".into());
        args.push("-l".into());
        args.push(self.config.languages.join("+").into());
        args.push("--psm".into());
        args.push(self.config.page_segmentation_mode.to_string().into());
        args
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, region: &Region) -> Result<String, Box<dyn std::error::Error>> {
        run_on_region_image(region, |image| {
            let mut command = Command::new(&self.config.binary);
            command.args(self.arguments(image));
            command
        })
    }
}
