use std::path::{Path, PathBuf};
use std::process::Command;

use crate::recognition::domain::text_recognizer::TextRecognizer;
use crate::shared::region::Region;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::infrastructure::image_file_writer::ImageFileWriter;

/// Writes `region` to a temporary PNG, runs the command built for that path
/// and returns its stdout. The image is deleted when this returns.
pub(crate) fn run_on_region_image(
    region: &Region,
    build: impl FnOnce(&Path) -> Command,
) -> Result<String, Box<dyn std::error::Error>> {
    let image = tempfile::Builder::new()
        .prefix("cue-")
        .suffix(".png")
        .tempfile()?;
    ImageFileWriter::new().write(image.path(), region)?;

    let mut command = build(image.path());
    let output = command
        .output()
        .map_err(|e| format!("failed to run {:?}: {e}", command.get_program()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "{:?} exited with {}: {}",
            command.get_program(),
            output.status,
            stderr.trim()
        )
        .into());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Recognizer backed by an arbitrary external program.
///
/// The program is invoked as `program [args...] <image.png>` and whatever it
/// prints on stdout is the recognized text. Used to plug in engines that
/// ship as command-line tools.
#[derive(Debug, Clone)]
pub struct CommandRecognizer {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandRecognizer {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl TextRecognizer for CommandRecognizer {
    fn recognize(&self, region: &Region) -> Result<String, Box<dyn std::error::Error>> {
        run_on_region_image(region, |image| {
            let mut command = Command::new(&self.program);
            command.args(&self.args).arg(image);
            command
        })
    }
}
